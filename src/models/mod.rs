mod mapped;
mod site;

pub use mapped::{MappedData, MappedValue};
pub use site::{SiteRecord, SITE_ID_FIELD};
