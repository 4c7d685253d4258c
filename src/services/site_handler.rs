use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::mapping::MappingSpec;
use crate::models::SiteRecord;
use crate::render::TemplateRenderer;
use crate::source::{LocalFileSource, RecordSource};
use crate::utils::{branch_config_filename, is_valid_site_id};
use crate::validate::FieldRules;

/// Fetch a site and check it against the rule set.
/// With `report_all`, every violation is logged before the first one is returned.
fn fetch_valid(
    source: &dyn RecordSource,
    rules: &FieldRules,
    site_id: &str,
    report_all: bool,
) -> Result<SiteRecord, PipelineError> {
    if !is_valid_site_id(site_id) {
        return Err(PipelineError::not_found(
            site_id,
            "site identifier is empty or not usable in a file name",
        ));
    }

    tracing::info!("Fetching site {} from {}", site_id, source.describe());
    let record = source.fetch(site_id)?;

    let violations = if report_all {
        rules.violations(&record)
    } else {
        rules.validate(&record).err().into_iter().collect()
    };
    for violation in &violations {
        match violation.value() {
            Some(value) => {
                tracing::error!(field = violation.field(), "Site {}: {}: {:?}", site_id, violation, value)
            }
            None => tracing::error!(field = violation.field(), "Site {}: {}", site_id, violation),
        }
    }
    if let Some(first) = violations.into_iter().next() {
        return Err(PipelineError::Validation(first));
    }

    tracing::info!("Site {} passed validation", site_id);
    Ok(record)
}

/// Fetch, validate, and persist a site record as `<site_id>_site_info.json`.
/// Returns the path of the saved file. Nothing is written for an invalid record.
pub fn validate_site(
    source: &dyn RecordSource,
    rules: &FieldRules,
    store: &LocalFileSource,
    site_id: &str,
    report_all: bool,
) -> Result<PathBuf, PipelineError> {
    let record = fetch_valid(source, rules, site_id, report_all)?;
    store.store(site_id, &record)
}

/// Fetch, validate, map, and render a site config into `output_dir`.
/// Returns the path of the rendered file.
pub fn generate_site(
    source: &dyn RecordSource,
    rules: &FieldRules,
    mapping: &MappingSpec,
    renderer: &TemplateRenderer,
    output_dir: &Path,
    site_id: &str,
) -> Result<PathBuf, PipelineError> {
    let record = fetch_valid(source, rules, site_id, false)?;
    let data = mapping.map(&record)?;

    let output = output_dir.join(branch_config_filename(site_id));
    renderer.render_to_file(&data, &output)?;
    Ok(output)
}
