/// Generate an opaque identifier for a reading-list entry.
///
/// Returns a 23-character URL-friendly string built with nanoid's
/// default alphabet.
pub fn generate_id() -> String {
    nanoid::nanoid!(23)
}
