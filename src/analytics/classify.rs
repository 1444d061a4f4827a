use serde::Serialize;

/// Status class a counted request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusClass {
    #[serde(rename = "2xx")]
    Success,
    #[serde(rename = "3xx")]
    Redirect,
    #[serde(rename = "4xx")]
    ClientError,
    #[serde(rename = "5xx")]
    ServerError,
}

impl StatusClass {
    /// Half-open ranges `[200,300) .. [500,600)`. Everything else is not counted.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200..=299 => Some(Self::Success),
            300..=399 => Some(Self::Redirect),
            400..=499 => Some(Self::ClientError),
            500..=599 => Some(Self::ServerError),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatusClass;

    #[test]
    fn class_ranges() {
        assert_eq!(StatusClass::from_code(200), Some(StatusClass::Success));
        assert_eq!(StatusClass::from_code(299), Some(StatusClass::Success));
        assert_eq!(StatusClass::from_code(301), Some(StatusClass::Redirect));
        assert_eq!(StatusClass::from_code(404), Some(StatusClass::ClientError));
        assert_eq!(StatusClass::from_code(599), Some(StatusClass::ServerError));
    }

    #[test]
    fn out_of_range_codes_are_not_counted() {
        assert_eq!(StatusClass::from_code(101), None);
        assert_eq!(StatusClass::from_code(199), None);
        assert_eq!(StatusClass::from_code(600), None);
        assert_eq!(StatusClass::from_code(0), None);
    }
}
