mod claims;
pub(crate) mod extractors;
pub(crate) mod services;

pub use claims::SessionUser;
pub(crate) use extractors::AuthUser;
