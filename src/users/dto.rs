use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordChangeRequest {
    pub new_password: String,
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
}
