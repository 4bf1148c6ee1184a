pub mod locale;
pub mod phone;
pub mod record;
pub mod redirect;
pub mod utm;
pub mod validation;
