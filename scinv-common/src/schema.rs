//! Element and attribute names of the SeisComP inventory schema
//!
//! Matching is done on local names, so documents using either a default
//! namespace or an explicit prefix resolve the same way.

/// Namespace URI prefix shared by every SeisComP schema version
pub const NAMESPACE_PREFIX: &str = "http://geofon.gfz-potsdam.de/ns/seiscomp3-schema/";

/// Hierarchy and equipment element names
pub mod element {
    pub const ROOT: &str = "seiscomp";
    pub const INVENTORY: &str = "Inventory";

    pub const NETWORK: &str = "network";
    pub const STATION: &str = "station";
    pub const SENSOR_LOCATION: &str = "sensorLocation";
    pub const STREAM: &str = "stream";

    pub const SENSOR: &str = "sensor";
    pub const DATALOGGER: &str = "datalogger";
    pub const RESPONSE: &str = "response";
    pub const RESPONSE_PAZ: &str = "responsePAZ";
    pub const DECIMATION: &str = "decimation";

    pub const COMMENT: &str = "comment";
    pub const COMMENT_TEXT: &str = "text";
}

/// Attribute names
pub mod attr {
    pub const PUBLIC_ID: &str = "publicID";
    pub const CODE: &str = "code";
    pub const NAME: &str = "name";
    pub const SENSOR: &str = "sensor";
    pub const DATALOGGER: &str = "datalogger";
    pub const RESPONSE: &str = "response";
}
