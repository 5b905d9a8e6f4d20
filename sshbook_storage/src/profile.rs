/// A stored server credential record.
///
/// The password is stored in clear text. That is a documented limitation of
/// the tool, not an accident; see the README security notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProfile {
    pub id: i64,
    pub ip: String,
    pub username: String,
    pub password: String,
    /// User-chosen unique identifier selecting this profile.
    pub label: String,
}

/// Field set for a profile about to be inserted; the id is assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub ip: String,
    pub username: String,
    pub password: String,
    pub label: String,
}
