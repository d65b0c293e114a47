//! Contract configuration: validation limits, paging and recall window.

use shared_types::PageRequest;

/// Configuration for the shipment contract.
#[derive(Debug, Clone)]
pub struct ContractConfig {
    /// Maximum length of ordinary string fields.
    pub max_string_length: usize,
    /// Maximum length of descriptions, comments and narratives.
    pub max_description_length: usize,
    /// Maximum length of a recall reason.
    pub max_recall_reason_length: usize,
    /// Maximum elements of any list argument.
    pub max_array_elements: usize,
    /// Page size used when the caller supplies none.
    pub default_page_size: u32,
    /// Upper bound for caller-supplied page sizes.
    pub max_page_size: u32,
    /// Related-shipment window used when none (or an invalid one) is given.
    pub default_recall_window_hours: i64,
    /// Upper bound for the related-shipment window.
    pub max_recall_window_hours: i64,
    /// Minimum organic history for a farm that claims one.
    pub organic_minimum_years: i32,
    /// Minimum buffer zone around organic beds.
    pub min_buffer_zone_meters: f64,
    /// Actionable queries scan `page_size * multiplier` records per page.
    pub actionable_scan_multiplier: u32,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            max_string_length: 256,
            max_description_length: 1024,
            max_recall_reason_length: 512,
            max_array_elements: 50,
            default_page_size: 10,
            max_page_size: 100,
            default_recall_window_hours: 72,
            max_recall_window_hours: 720,
            organic_minimum_years: 3,
            min_buffer_zone_meters: 8.0,
            actionable_scan_multiplier: 3,
        }
    }
}

impl ContractConfig {
    /// Page size for a request after defaulting and clamping.
    #[must_use]
    pub fn page_size(&self, page: &PageRequest) -> u32 {
        page.effective_size(self.default_page_size, self.max_page_size)
    }

    /// Related-shipment window in hours.
    ///
    /// Missing or non-positive values select the default; larger values are
    /// clamped to the maximum.
    #[must_use]
    pub fn recall_window_hours(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(h) if h > 0 => h.min(self.max_recall_window_hours),
            _ => self.default_recall_window_hours,
        }
    }

    /// Maximum length of id-like fields that may hold a full id.
    #[must_use]
    pub fn max_identity_length(&self) -> usize {
        self.max_string_length * 2
    }
}
