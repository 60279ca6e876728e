//! Metadata predicates applied before taking top-k.

use crate::record::{SearchFilters, VectorMetadata};

/// True when the document metadata satisfies every present filter field.
///
/// The `tags` filter passes when ANY requested tag is present on the
/// document; all other fields are exact string matches.
pub fn matches(filters: &SearchFilters, meta: &VectorMetadata) -> bool {
    if let Some(pkg) = &filters.package_name {
        if &meta.package_name != pkg {
            return false;
        }
    }
    if let Some(name) = &filters.component_name {
        if &meta.component_name != name {
            return false;
        }
    }
    if let Some(facet) = &filters.facet {
        if &meta.facet != facet {
            return false;
        }
    }
    if let Some(version) = &filters.version {
        if &meta.version != version {
            return false;
        }
    }
    if let Some(tags) = &filters.tags {
        if !tags.iter().any(|t| meta.tags.iter().any(|m| m == t)) {
            return false;
        }
    }
    true
}
