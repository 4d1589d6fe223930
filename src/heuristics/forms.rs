use crate::domain::{FieldKind, FormDescriptor};

/// Index of the first form that asks for both a text field and a password.
pub fn find_credential_form(forms: &[FormDescriptor]) -> Option<usize> {
    forms
        .iter()
        .position(|form| form.contains(&FieldKind::Text) && form.contains(&FieldKind::Password))
}
