use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    #[error("method `{0}` is private")]
    Private(String),
    #[error("unknown method `{0}`")]
    Unknown(String),
}

/// Public methods reachable through name-based dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMethod {
    Open,
    Close,
    IsOpen,
    Option,
    Destroy,
}

impl ModalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModalMethod::Open => "open",
            ModalMethod::Close => "close",
            ModalMethod::IsOpen => "isOpen",
            ModalMethod::Option => "option",
            ModalMethod::Destroy => "destroy",
        }
    }
}

impl FromStr for ModalMethod {
    type Err = MethodError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.starts_with('_') {
            return Err(MethodError::Private(name.to_string()));
        }
        match name {
            "open" => Ok(ModalMethod::Open),
            "close" => Ok(ModalMethod::Close),
            "isOpen" => Ok(ModalMethod::IsOpen),
            "option" => Ok(ModalMethod::Option),
            "destroy" => Ok(ModalMethod::Destroy),
            _ => Err(MethodError::Unknown(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_methods_parse() {
        for method in [
            ModalMethod::Open,
            ModalMethod::Close,
            ModalMethod::IsOpen,
            ModalMethod::Option,
            ModalMethod::Destroy,
        ] {
            assert_eq!(method.as_str().parse::<ModalMethod>(), Ok(method));
        }
    }

    #[test]
    fn test_private_and_unknown_rejected() {
        assert_eq!(
            "_init".parse::<ModalMethod>(),
            Err(MethodError::Private("_init".into()))
        );
        assert_eq!(
            "toggle".parse::<ModalMethod>(),
            Err(MethodError::Unknown("toggle".into()))
        );
    }
}
