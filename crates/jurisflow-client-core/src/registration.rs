use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Advogado,
    Estagiario,
}

impl UserType {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "advogado" | "lawyer" => Some(Self::Advogado),
            "estagiario" | "estagiário" | "intern" => Some(Self::Estagiario),
            _ => None,
        }
    }

    /// Interns never carry an OAB registration.
    #[must_use]
    pub fn requires_oab(self) -> bool {
        matches!(self, Self::Advogado)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Por favor, preencha todos os campos obrigatórios.")]
    MissingRequiredFields,
    #[error("Número da OAB é obrigatório para advogados.")]
    MissingOabNumber,
    #[error("As senhas não coincidem.")]
    PasswordMismatch,
    #[error("A senha deve ter pelo menos {} caracteres.", MIN_PASSWORD_CHARS)]
    PasswordTooShort,
    #[error("Você deve aceitar os termos de uso e política de privacidade.")]
    TermsNotAccepted,
}

pub const MIN_PASSWORD_CHARS: usize = 8;

/// Raw office registration input, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub office_name: String,
    pub cnpj: String,
    pub responsible_name: String,
    pub oab_number: String,
    pub user_type: Option<UserType>,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

/// Body of `POST /api/auth/register`. Roles and permissions are left to the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub office_name: String,
    pub cnpj: String,
    pub responsible_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oab_number: Option<String>,
    pub user_type: UserType,
    pub phone: String,
}

impl RegistrationForm {
    /// Checks run in a fixed order and the first failure wins. Passwords are
    /// compared untrimmed; every other field is trimmed.
    pub fn validate(&self) -> Result<RegistrationRequest, RegistrationError> {
        let required = [
            self.office_name.trim(),
            self.cnpj.trim(),
            self.responsible_name.trim(),
            self.email.trim(),
            self.phone.trim(),
            self.username.trim(),
            self.password.as_str(),
        ];
        let Some(user_type) = self.user_type else {
            return Err(RegistrationError::MissingRequiredFields);
        };
        if required.iter().any(|field| field.is_empty()) {
            return Err(RegistrationError::MissingRequiredFields);
        }

        let oab_number = self.oab_number.trim();
        if user_type.requires_oab() && oab_number.is_empty() {
            return Err(RegistrationError::MissingOabNumber);
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(RegistrationError::PasswordTooShort);
        }
        if !self.accept_terms {
            return Err(RegistrationError::TermsNotAccepted);
        }

        Ok(RegistrationRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            email: self.email.trim().to_lowercase(),
            office_name: self.office_name.trim().to_string(),
            cnpj: self.cnpj.trim().to_string(),
            responsible_name: self.responsible_name.trim().to_string(),
            oab_number: (user_type.requires_oab() && !oab_number.is_empty())
                .then(|| oab_number.to_string()),
            user_type,
            phone: self.phone.trim().to_string(),
        })
    }
}
