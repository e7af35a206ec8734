//! Canned replies: `comp?`, `no comp`

/// Reply to a comp request.
pub fn comp_request() -> &'static str {
    "comp? :eyes: @CSGO"
}

/// Reply when a comp is called off.
pub fn no_comp() -> &'static str {
    "Damn :("
}
