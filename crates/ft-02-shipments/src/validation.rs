//! Input validation and the raw payload shapes callers submit.
//!
//! Raw inputs carry dates as RFC 3339 strings and every field optional, so a
//! missing field surfaces as a [`ContractError::Validation`] naming the field
//! rather than a deserialization error.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use shared_types::ContractError;

use crate::config::ContractConfig;
use crate::domain::{
    CertificationStatus, DistributorData, FarmerData, GeoPoint, ProcessorData, RetailerData,
    SensorLog,
};

/// Core fields of a new shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
    pub shipment_id: String,
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: f64,
    pub unit_of_measure: String,
}

/// Farmer stage payload as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmerDataInput {
    pub farmer_name: String,
    pub farm_location: String,
    pub farm_coordinates: Option<GeoPoint>,
    pub crop_type: String,
    pub planting_date: String,
    pub harvest_date: String,
    pub farming_practice: String,
    pub bed_type: String,
    pub irrigation_method: String,
    pub fertilizer_used: String,
    pub certification_document_hash: String,
    pub certification_document_url: String,
    pub organic_since: String,
    pub buffer_zone_meters: Option<f64>,
    pub pest_free_confirmation: bool,
    pub pests_found: Vec<String>,
    pub pest_treatment_actions: String,
    pub destination_processor_id: String,
}

/// Processor stage payload as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorDataInput {
    pub date_processed: String,
    pub processing_type: String,
    pub processing_line_id: String,
    pub processing_location: String,
    pub processing_coordinates: Option<GeoPoint>,
    pub contamination_check: String,
    pub output_batch_id: String,
    pub expiry_date: String,
    pub quality_certifications: Vec<String>,
    pub destination_distributor_id: String,
}

/// Distributor stage payload as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistributorDataInput {
    pub pickup_date_time: String,
    pub delivery_date_time: String,
    pub distribution_line_id: String,
    pub temperature_range: String,
    pub storage_temperature: Option<f64>,
    pub transit_location_log: Vec<String>,
    pub transit_gps_log: Vec<GeoPoint>,
    pub transport_conditions: String,
    pub distribution_center: String,
    pub destination_retailer_id: String,
}

/// Retailer stage payload as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetailerDataInput {
    pub date_received: String,
    pub retailer_line_id: String,
    pub product_name_retail: String,
    pub shelf_life: String,
    pub sell_by_date: String,
    pub retailer_expiry_date: String,
    pub store_id: String,
    pub store_location: String,
    pub store_coordinates: Option<GeoPoint>,
    pub price: Option<f64>,
    pub qr_code_link: String,
}

/// A sensor reading as submitted. The timestamp defaults to transaction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorLogInput {
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
    pub coordinates: Option<GeoPoint>,
}

/// A certifier decision as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationInput {
    pub inspection_date: String,
    pub inspection_report_hash: String,
    pub certification_status: String,
    pub comments: String,
}

/// A validated certifier decision.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificationDecision {
    pub inspection_date: DateTime<Utc>,
    pub inspection_report_hash: String,
    pub status: CertificationStatus,
    pub comments: String,
}

/// An input lot to spend in a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConsumption {
    pub shipment_id: String,
}

/// An output lot to create in a transformation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub new_shipment_id: String,
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: f64,
    pub unit_of_measure: String,
}

/// Field-level checks parameterised by [`ContractConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Validator<'c> {
    config: &'c ContractConfig,
}

impl<'c> Validator<'c> {
    /// Validator for the given limits.
    #[must_use]
    pub fn new(config: &'c ContractConfig) -> Self {
        Self { config }
    }

    /// Non-blank and within `max` bytes.
    pub fn required(&self, value: &str, field: &str, max: usize) -> Result<(), ContractError> {
        if value.trim().is_empty() {
            return Err(ContractError::validation(field, "cannot be empty"));
        }
        self.optional(value, field, max)
    }

    /// Within `max` bytes when present.
    pub fn optional(&self, value: &str, field: &str, max: usize) -> Result<(), ContractError> {
        if value.len() > max {
            return Err(ContractError::validation(
                field,
                format!("exceeds max length {max}"),
            ));
        }
        Ok(())
    }

    /// Required string with the default length limit.
    pub fn text(&self, value: &str, field: &str) -> Result<(), ContractError> {
        self.required(value, field, self.config.max_string_length)
    }

    /// Required identity reference (alias or full id).
    pub fn identity_ref(&self, value: &str, field: &str) -> Result<(), ContractError> {
        self.required(value, field, self.config.max_identity_length())
    }

    /// Bounded list of bounded strings.
    pub fn string_list(
        &self,
        items: &[String],
        field: &str,
        max_item_len: usize,
    ) -> Result<(), ContractError> {
        self.list_len(items.len(), field)?;
        for (i, item) in items.iter().enumerate() {
            self.optional(item, &format!("{field}[{i}]"), max_item_len)?;
        }
        Ok(())
    }

    /// At most `max_array_elements` items.
    pub fn list_len(&self, len: usize, field: &str) -> Result<(), ContractError> {
        if len > self.config.max_array_elements {
            return Err(ContractError::validation(
                field,
                format!(
                    "has {len} items, exceeding maximum of {}",
                    self.config.max_array_elements
                ),
            ));
        }
        Ok(())
    }

    /// Latitude and longitude in range.
    pub fn geo_point(&self, point: &GeoPoint, field: &str) -> Result<(), ContractError> {
        if !(-90.0..=90.0).contains(&point.latitude) {
            return Err(ContractError::validation(
                format!("{field}.latitude"),
                "must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&point.longitude) {
            return Err(ContractError::validation(
                format!("{field}.longitude"),
                "must be between -180 and 180",
            ));
        }
        Ok(())
    }

    /// A geo point that must be present.
    pub fn required_geo_point(
        &self,
        point: Option<GeoPoint>,
        field: &str,
    ) -> Result<GeoPoint, ContractError> {
        let point = point.ok_or_else(|| ContractError::validation(field, "is required"))?;
        self.geo_point(&point, field)?;
        Ok(point)
    }

    /// Strictly positive, finite quantity.
    pub fn quantity(&self, value: f64, field: &str) -> Result<(), ContractError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ContractError::validation(
                field,
                format!("must be positive, got {value}"),
            ));
        }
        Ok(())
    }

    /// Core shipment fields.
    pub fn new_shipment(&self, input: &NewShipment) -> Result<(), ContractError> {
        self.text(&input.shipment_id, "shipmentId")?;
        self.text(&input.product_name, "productName")?;
        self.optional(&input.description, "description", self.config.max_description_length)?;
        self.quantity(input.quantity, "quantity")?;
        self.text(&input.unit_of_measure, "unitOfMeasure")
    }

    /// Output product of a transformation.
    pub fn new_product(&self, product: &NewProduct, index: usize) -> Result<(), ContractError> {
        let prefix = format!("newProducts[{index}]");
        self.text(&product.new_shipment_id, &format!("{prefix}.newShipmentId"))?;
        self.text(&product.product_name, &format!("{prefix}.productName"))?;
        self.optional(
            &product.description,
            &format!("{prefix}.description"),
            self.config.max_description_length,
        )?;
        self.quantity(product.quantity, &format!("{prefix}.quantity"))?;
        self.text(&product.unit_of_measure, &format!("{prefix}.unitOfMeasure"))
    }

    /// Validate a certifier decision.
    pub fn certification(
        &self,
        input: &CertificationInput,
    ) -> Result<CertificationDecision, ContractError> {
        let inspection_date = parse_required_date(&input.inspection_date, "inspectionDate")?;
        self.optional(
            &input.inspection_report_hash,
            "inspectionReportHash",
            self.config.max_string_length,
        )?;
        self.optional(&input.comments, "comments", self.config.max_description_length)?;
        let status = input.certification_status.parse::<CertificationStatus>()?;
        Ok(CertificationDecision {
            inspection_date,
            inspection_report_hash: input.inspection_report_hash.clone(),
            status,
            comments: input.comments.clone(),
        })
    }

    /// Validate a farmer payload. Actor fields are left empty and the
    /// destination is left unresolved.
    pub fn farmer_data(
        &self,
        input: &FarmerDataInput,
        now: DateTime<Utc>,
    ) -> Result<FarmerData, ContractError> {
        let max = self.config.max_string_length;
        self.text(&input.farmer_name, "farmerData.farmerName")?;
        self.text(&input.farm_location, "farmerData.farmLocation")?;
        let farm_coordinates =
            self.required_geo_point(input.farm_coordinates, "farmerData.farmCoordinates")?;
        self.text(&input.crop_type, "farmerData.cropType")?;
        let planting_date = parse_required_date(&input.planting_date, "farmerData.plantingDate")?;
        let harvest_date = parse_required_date(&input.harvest_date, "farmerData.harvestDate")?;
        self.text(&input.farming_practice, "farmerData.farmingPractice")?;
        self.text(&input.bed_type, "farmerData.bedType")?;
        self.text(&input.irrigation_method, "farmerData.irrigationMethod")?;
        self.optional(&input.fertilizer_used, "farmerData.fertilizerUsed", max)?;
        self.optional(
            &input.certification_document_hash,
            "farmerData.certificationDocumentHash",
            max,
        )?;
        self.optional(
            &input.certification_document_url,
            "farmerData.certificationDocumentUrl",
            max * 2,
        )?;

        let organic_since = parse_optional_date(&input.organic_since, "farmerData.organicSince")?;
        if let Some(since) = organic_since {
            let months = u32::try_from(self.config.organic_minimum_years.max(0) * 12).unwrap_or(0);
            let qualifies_at = since
                .checked_add_months(Months::new(months))
                .ok_or_else(|| ContractError::validation("farmerData.organicSince", "out of range"))?;
            if qualifies_at > now {
                return Err(ContractError::validation(
                    "farmerData.organicSince",
                    format!(
                        "farm must be organic for at least {} years",
                        self.config.organic_minimum_years
                    ),
                ));
            }
        }

        if let Some(buffer) = input.buffer_zone_meters {
            if !buffer.is_finite() || buffer < self.config.min_buffer_zone_meters {
                return Err(ContractError::validation(
                    "farmerData.bufferZoneMeters",
                    format!(
                        "buffer zones must be at least {} meters",
                        self.config.min_buffer_zone_meters
                    ),
                ));
            }
        }

        self.identity_ref(
            &input.destination_processor_id,
            "farmerData.destinationProcessorId",
        )?;

        self.string_list(&input.pests_found, "farmerData.pestsFound", max)?;
        let pests_reported = input.pests_found.iter().any(|p| !p.trim().is_empty());
        match (input.pest_free_confirmation, pests_reported) {
            (true, true) => {
                return Err(ContractError::validation(
                    "farmerData.pestFreeConfirmation",
                    "cannot confirm pest-free while reporting pests",
                ))
            }
            (false, false) => {
                return Err(ContractError::validation(
                    "farmerData.pestFreeConfirmation",
                    "either pestFreeConfirmation must be true or pestsFound specified",
                ))
            }
            (false, true) => self.required(
                &input.pest_treatment_actions,
                "farmerData.pestTreatmentActions",
                self.config.max_description_length,
            )?,
            (true, false) => {}
        }

        Ok(FarmerData {
            farmer_id: String::new(),
            farmer_alias: String::new(),
            farmer_name: input.farmer_name.clone(),
            farm_location: input.farm_location.clone(),
            farm_coordinates,
            crop_type: input.crop_type.clone(),
            planting_date,
            harvest_date,
            farming_practice: input.farming_practice.clone(),
            bed_type: input.bed_type.clone(),
            irrigation_method: input.irrigation_method.clone(),
            fertilizer_used: input.fertilizer_used.clone(),
            certification_document_hash: input.certification_document_hash.clone(),
            certification_document_url: input.certification_document_url.clone(),
            organic_since,
            buffer_zone_meters: input.buffer_zone_meters,
            pest_free_confirmation: input.pest_free_confirmation,
            pests_found: input.pests_found.clone(),
            pest_treatment_actions: input.pest_treatment_actions.clone(),
            destination_processor_id: input.destination_processor_id.trim().to_string(),
        })
    }

    /// Validate a processor payload.
    pub fn processor_data(&self, input: &ProcessorDataInput) -> Result<ProcessorData, ContractError> {
        let max = self.config.max_string_length;
        let date_processed =
            parse_required_date(&input.date_processed, "processorData.dateProcessed")?;
        self.text(&input.processing_type, "processorData.processingType")?;
        self.text(&input.processing_line_id, "processorData.processingLineId")?;
        self.text(&input.processing_location, "processorData.processingLocation")?;
        let processing_coordinates = self.required_geo_point(
            input.processing_coordinates,
            "processorData.processingCoordinates",
        )?;
        self.text(&input.contamination_check, "processorData.contaminationCheck")?;
        self.optional(&input.output_batch_id, "processorData.outputBatchId", max)?;
        let expiry_date = parse_optional_date(&input.expiry_date, "processorData.expiryDate")?;
        self.string_list(
            &input.quality_certifications,
            "processorData.qualityCertifications",
            max,
        )?;
        self.identity_ref(
            &input.destination_distributor_id,
            "processorData.destinationDistributorId",
        )?;

        Ok(ProcessorData {
            processor_id: String::new(),
            processor_alias: String::new(),
            date_processed,
            processing_type: input.processing_type.clone(),
            processing_line_id: input.processing_line_id.clone(),
            processing_location: input.processing_location.clone(),
            processing_coordinates,
            contamination_check: input.contamination_check.clone(),
            output_batch_id: input.output_batch_id.clone(),
            expiry_date,
            quality_certifications: input.quality_certifications.clone(),
            destination_distributor_id: input.destination_distributor_id.trim().to_string(),
        })
    }

    /// Validate a distributor payload.
    pub fn distributor_data(
        &self,
        input: &DistributorDataInput,
    ) -> Result<DistributorData, ContractError> {
        let max = self.config.max_string_length;
        let long = self.config.max_description_length;
        let pickup_date_time =
            parse_required_date(&input.pickup_date_time, "distributorData.pickupDateTime")?;
        let delivery_date_time =
            parse_optional_date(&input.delivery_date_time, "distributorData.deliveryDateTime")?;
        self.text(&input.distribution_line_id, "distributorData.distributionLineId")?;
        self.optional(&input.temperature_range, "distributorData.temperatureRange", max)?;
        self.string_list(
            &input.transit_location_log,
            "distributorData.transitLocationLog",
            long,
        )?;
        self.list_len(input.transit_gps_log.len(), "distributorData.transitGpsLog")?;
        for (i, point) in input.transit_gps_log.iter().enumerate() {
            self.geo_point(point, &format!("distributorData.transitGpsLog[{i}]"))?;
        }
        self.optional(
            &input.transport_conditions,
            "distributorData.transportConditions",
            long,
        )?;
        self.text(&input.distribution_center, "distributorData.distributionCenter")?;
        self.identity_ref(
            &input.destination_retailer_id,
            "distributorData.destinationRetailerId",
        )?;

        Ok(DistributorData {
            distributor_id: String::new(),
            distributor_alias: String::new(),
            pickup_date_time,
            delivery_date_time,
            distribution_line_id: input.distribution_line_id.clone(),
            temperature_range: input.temperature_range.clone(),
            storage_temperature: input.storage_temperature,
            transit_location_log: input.transit_location_log.clone(),
            transit_gps_log: input.transit_gps_log.clone(),
            transport_conditions: input.transport_conditions.clone(),
            distribution_center: input.distribution_center.clone(),
            destination_retailer_id: input.destination_retailer_id.trim().to_string(),
        })
    }

    /// Validate a retailer payload.
    pub fn retailer_data(&self, input: &RetailerDataInput) -> Result<RetailerData, ContractError> {
        let max = self.config.max_string_length;
        let date_received = parse_required_date(&input.date_received, "retailerData.dateReceived")?;
        let sell_by_date = parse_optional_date(&input.sell_by_date, "retailerData.sellByDate")?;
        let retailer_expiry_date =
            parse_optional_date(&input.retailer_expiry_date, "retailerData.retailerExpiryDate")?;
        self.text(&input.retailer_line_id, "retailerData.retailerLineId")?;
        self.text(&input.product_name_retail, "retailerData.productNameRetail")?;
        self.optional(&input.shelf_life, "retailerData.shelfLife", max)?;
        self.optional(&input.store_id, "retailerData.storeId", max)?;
        self.text(&input.store_location, "retailerData.storeLocation")?;
        let store_coordinates =
            self.required_geo_point(input.store_coordinates, "retailerData.storeCoordinates")?;
        self.optional(&input.qr_code_link, "retailerData.qrCodeLink", max * 2)?;
        if let Some(price) = input.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ContractError::validation(
                    "retailerData.price",
                    "cannot be negative",
                ));
            }
        }

        Ok(RetailerData {
            retailer_id: String::new(),
            retailer_alias: String::new(),
            date_received,
            retailer_line_id: input.retailer_line_id.clone(),
            product_name_retail: input.product_name_retail.clone(),
            shelf_life: input.shelf_life.clone(),
            sell_by_date,
            retailer_expiry_date,
            store_id: input.store_id.clone(),
            store_location: input.store_location.clone(),
            store_coordinates,
            price: input.price,
            qr_code_link: input.qr_code_link.clone(),
        })
    }

    /// Validate a sensor reading; a blank timestamp becomes `now`.
    pub fn sensor_log(
        &self,
        input: &SensorLogInput,
        now: DateTime<Utc>,
    ) -> Result<SensorLog, ContractError> {
        let timestamp = parse_optional_date(&input.timestamp, "timestamp")?.unwrap_or(now);
        if !input.temperature.is_finite() {
            return Err(ContractError::validation("temperature", "must be a number"));
        }
        if !(0.0..=100.0).contains(&input.humidity) {
            return Err(ContractError::validation(
                "humidity",
                "must be between 0 and 100",
            ));
        }
        let coordinates = self.required_geo_point(input.coordinates, "coordinates")?;
        Ok(SensorLog {
            timestamp,
            temperature: input.temperature,
            humidity: input.humidity,
            coordinates,
            recorded_by: String::new(),
        })
    }
}

/// Parse an RFC 3339 date that must be present.
pub fn parse_required_date(value: &str, field: &str) -> Result<DateTime<Utc>, ContractError> {
    parse_optional_date(value, field)?
        .ok_or_else(|| ContractError::validation(field, "is a required date field and cannot be empty"))
}

/// Parse an RFC 3339 date; blank means absent.
pub fn parse_optional_date(value: &str, field: &str) -> Result<Option<DateTime<Utc>>, ContractError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|d| Some(d.with_timezone(&Utc)))
        .map_err(|e| {
            ContractError::validation(
                field,
                format!("invalid format (expected RFC 3339 'YYYY-MM-DDTHH:MM:SSZ'): {e}"),
            )
        })
}
