/// Case-insensitive substring match of a school name against a profile's
/// free-text education entries. Used by downstream filters over the store.
pub fn matches_school(educations: &[String], query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return false;
    }
    educations
        .iter()
        .any(|entry| entry.to_lowercase().contains(&query))
}
