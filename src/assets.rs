//! Placeholder images compiled into the binary.
//!
//! They are addressed by their repository-relative path so a record can point
//! at them the same way it points at any other file.

pub const UNIVERSITY_LOGO: &str = "assets/images/university_logo_placeholder.svg";
pub const PHOTO_PLACEHOLDER: &str = "assets/images/passport_size_photo_placeholder.svg";
pub const STUDENT_SIGNATURE: &str = "assets/images/student_sign_placeholder.svg";
pub const CONTROLLER_SIGNATURE: &str = "assets/images/controller_of_examination_signature.svg";

const BUNDLED: &[(&str, &[u8])] = &[
    (
        UNIVERSITY_LOGO,
        include_bytes!("../assets/images/university_logo_placeholder.svg"),
    ),
    (
        PHOTO_PLACEHOLDER,
        include_bytes!("../assets/images/passport_size_photo_placeholder.svg"),
    ),
    (
        STUDENT_SIGNATURE,
        include_bytes!("../assets/images/student_sign_placeholder.svg"),
    ),
    (
        CONTROLLER_SIGNATURE,
        include_bytes!("../assets/images/controller_of_examination_signature.svg"),
    ),
];

/// Look up a bundled asset by reference. A leading `./` or `/` is ignored.
pub fn bundled(reference: &str) -> Option<&'static [u8]> {
    let path = reference.trim_start_matches("./").trim_start_matches('/');
    BUNDLED
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, bytes)| *bytes)
}
