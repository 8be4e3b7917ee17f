//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("El nombre de usuario es obligatorio".to_string());
    }

    if username.len() < 3 {
        return Err("El nombre de usuario debe tener al menos 3 caracteres".to_string());
    }

    if username.len() > 32 {
        return Err("El nombre de usuario debe tener como máximo 32 caracteres".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(
            "El nombre de usuario solo puede contener letras, números y guiones bajos".to_string(),
        );
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("El correo electrónico es obligatorio".to_string());
    }

    if email.len() > 254 {
        return Err("El correo electrónico debe tener como máximo 254 caracteres".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Formato de correo electrónico inválido".to_string());
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("El nombre es obligatorio".to_string());
    }

    if trimmed.chars().count() > 100 {
        return Err("El nombre debe tener como máximo 100 caracteres".to_string());
    }

    Ok(())
}

/// Validate password strength for new accounts
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("La contraseña es obligatoria".to_string());
    }

    if password.len() < 8 {
        return Err("La contraseña debe tener al menos 8 caracteres".to_string());
    }

    if password.len() > 128 {
        return Err("La contraseña debe tener como máximo 128 caracteres".to_string());
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if !has_upper {
        return Err("La contraseña debe contener al menos una letra mayúscula".to_string());
    }

    if !has_lower {
        return Err("La contraseña debe contener al menos una letra minúscula".to_string());
    }

    if !has_digit {
        return Err("La contraseña debe contener al menos un dígito".to_string());
    }

    if !has_special {
        return Err("La contraseña debe contener al menos un carácter especial".to_string());
    }

    Ok(())
}
