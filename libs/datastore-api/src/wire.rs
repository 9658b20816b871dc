//! Datastore v3 entity messages.
//!
//! Field numbers follow the v3 `EntityProto` layout. Point, user and
//! reference values are carried as nested messages rather than groups.
//! Only the read-path subset is modelled.

/// One stored entity as it comes off the wire.
#[derive(Clone, PartialEq, prost::Message)]
pub struct EntityProto {
    #[prost(message, optional, tag = "13")]
    pub key: Option<Reference>,

    /// Indexed properties.
    #[prost(message, repeated, tag = "14")]
    pub property: Vec<Property>,

    /// Unindexed properties.
    #[prost(message, repeated, tag = "15")]
    pub raw_property: Vec<Property>,
}

/// Serialized entity key.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Reference {
    #[prost(string, tag = "13")]
    pub app: String,

    #[prost(string, tag = "20")]
    pub name_space: String,

    #[prost(message, optional, tag = "14")]
    pub path: Option<Path>,
}

#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Path {
    #[prost(message, repeated, tag = "1")]
    pub element: Vec<PathElement>,
}

/// `kind` plus either a numeric id or a string name. Neither set means incomplete.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct PathElement {
    #[prost(string, tag = "2")]
    pub kind: String,

    #[prost(int64, optional, tag = "3")]
    pub id: Option<i64>,

    #[prost(string, optional, tag = "4")]
    pub name: Option<String>,
}

/// Raw field descriptor: name, multiplicity flag and type-tagged payload.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Property {
    #[prost(enumeration = "Meaning", optional, tag = "1")]
    pub meaning: Option<i32>,

    #[prost(string, optional, tag = "2")]
    pub meaning_uri: Option<String>,

    #[prost(string, tag = "3")]
    pub name: String,

    #[prost(bool, tag = "4")]
    pub multiple: bool,

    #[prost(message, optional, tag = "5")]
    pub value: Option<PropertyValue>,
}

impl Property {
    /// Known meaning, if any. Unknown numbers are treated as no meaning.
    pub fn known_meaning(&self) -> Option<Meaning> {
        self.meaning.and_then(|m| Meaning::try_from(m).ok())
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PropertyValue {
    #[prost(int64, optional, tag = "1")]
    pub int64_value: Option<i64>,

    #[prost(bool, optional, tag = "2")]
    pub boolean_value: Option<bool>,

    #[prost(bytes = "vec", optional, tag = "3")]
    pub string_value: Option<Vec<u8>>,

    #[prost(double, optional, tag = "4")]
    pub double_value: Option<f64>,

    #[prost(message, optional, tag = "5")]
    pub point_value: Option<PointValue>,

    #[prost(message, optional, tag = "8")]
    pub user_value: Option<UserValue>,

    #[prost(message, optional, tag = "12")]
    pub reference_value: Option<Reference>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PointValue {
    #[prost(double, tag = "6")]
    pub x: f64,

    #[prost(double, tag = "7")]
    pub y: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UserValue {
    #[prost(string, tag = "9")]
    pub email: String,

    #[prost(string, tag = "10")]
    pub auth_domain: String,
}

/// Semantic tag refining how a payload is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Meaning {
    NoMeaning = 0,
    AtomCategory = 1,
    AtomLink = 2,
    AtomTitle = 3,
    AtomContent = 4,
    AtomSummary = 5,
    AtomAuthor = 6,
    GdWhen = 7,
    GdEmail = 8,
    GeorssPoint = 9,
    GdIm = 10,
    GdPhonenumber = 11,
    GdPostaladdress = 12,
    GdRating = 13,
    Blob = 14,
    Text = 15,
    Bytestring = 16,
    Blobkey = 17,
    IndexValue = 18,
    EntityProto = 19,
}
