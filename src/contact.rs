use crate::db::Database;
use crate::source::SourceError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const NOT_SPECIFIED: &str = "not specified";

/// Warehouse floor-area bands offered on the contact form.
pub const WAREHOUSE_SIZES: [&str; 4] = [
    "100 - 300 sq.m.",
    "301 - 500 sq.m.",
    "501 - 1,000 sq.m.",
    "1,001+ sq.m.",
];

#[derive(Error, Debug)]
pub enum ContactError {
    #[error("First name and phone number are required")]
    MissingRequired,

    #[error("Could not store inquiry: {0}")]
    Storage(#[from] SourceError),
}

/// A contact-form submission, in the JSON shape the website posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub line_id: String,
    pub warehouse_size: Vec<String>,
    pub details: String,
}

fn or_not_specified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { NOT_SPECIFIED } else { trimmed }
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.first_name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(ContactError::MissingRequired);
        }
        Ok(())
    }

    /// Plain-text notification body for the sales inbox.
    pub fn summary(&self, received_at: DateTime<Utc>) -> String {
        let sizes = if self.warehouse_size.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            self.warehouse_size.join(", ")
        };
        // Bangkok has no DST
        let local = FixedOffset::east_opt(7 * 3600)
            .map(|tz| received_at.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| received_at.to_rfc3339());
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());

        format!(
            "New inquiry from the SP Warehouse website\n\
             ========================================\n\
             \n\
             Customer:\n\
             - Name: {}\n\
             - Phone: {}\n\
             - Email: {}\n\
             - Address: {}\n\
             - LINE ID: {}\n\
             \n\
             Requirements:\n\
             - Warehouse size: {}\n\
             - Details: {}\n\
             \n\
             ========================================\n\
             Received: {} (Asia/Bangkok)\n",
            name.trim(),
            self.phone.trim(),
            or_not_specified(&self.email),
            or_not_specified(&self.address),
            or_not_specified(&self.line_id),
            sizes,
            or_not_specified(&self.details),
            local,
        )
    }

    /// Validate and store the inquiry. Delivery by email happens elsewhere.
    pub async fn submit(&self, db: &Database, received_at: DateTime<Utc>) -> Result<(), ContactError> {
        self.validate()?;
        db.insert_contact(self, received_at).await?;
        info!(phone = %self.phone.trim(), "contact inquiry stored");
        Ok(())
    }
}
