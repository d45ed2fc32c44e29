pub mod cache;
pub mod conversion;
pub mod features;
pub mod network_type;
pub mod provider;

/// Value of the first tag with the given key.
pub fn tag_value<'a>(tags: &'a [osm_xml::Tag], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.key == key)
        .map(|tag| tag.val.as_str())
}
