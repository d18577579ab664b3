use std::path::Path;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::application::models::profile::Profile;
use crate::error::AppError;

/// Image URL columns in the export. Profiles with more images are
/// truncated, profiles with fewer get blank cells.
const IMAGE_COLUMNS: usize = 6;

/// Appends one row per profile to a flat CSV meant for spreadsheets.
/// The header is written only when the file is new or empty, so repeated
/// runs accumulate rows under a single header.
pub fn append_profiles(path: &Path, profiles: &[Profile]) -> Result<usize, AppError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        let mut header = vec![
            "timestamp".to_string(),
            "user_id".to_string(),
            "name".to_string(),
            "age".to_string(),
            "location".to_string(),
            "education".to_string(),
        ];
        for i in 1..=IMAGE_COLUMNS {
            header.push(format!("image{i}"));
        }
        writer.write_record(&header)?;
    }

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    for profile in profiles {
        let mut record = vec![
            timestamp.clone(),
            profile.profile_id.clone(),
            profile.info.first_name.clone(),
            profile
                .info
                .age
                .map(|a| a.to_string())
                .unwrap_or_default(),
            profile.info.location.clone().unwrap_or_default(),
            profile.info.educations.join("; "),
        ];
        for slot in 0..IMAGE_COLUMNS {
            record.push(
                profile
                    .images
                    .get(slot)
                    .map(|i| i.url.clone())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!("Appended {} rows to {}", profiles.len(), path.display());
    Ok(profiles.len())
}
