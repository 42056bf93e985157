use crate::errors::MethodError;
use crate::fields::Field;
use crate::model::{Instance, Schema};
use chrono::NaiveDate;
use serde_json::{Map, Value};

pub const ADMIN_LOGIN: &str = "admin";

static METHOD_REQUEST: Schema = Schema {
    name: "MethodRequest",
    fields: &[
        ("account", Field::char().nullable()),
        ("login", Field::char().required().nullable()),
        ("token", Field::char().required().nullable()),
        ("arguments", Field::arguments().required().nullable()),
        ("method", Field::char().required()),
    ],
};

static ONLINE_SCORE_REQUEST: Schema = Schema {
    name: "OnlineScoreRequest",
    fields: &[
        ("first_name", Field::char().nullable()),
        ("last_name", Field::char().nullable()),
        ("email", Field::email().nullable()),
        ("phone", Field::phone().nullable()),
        ("birthday", Field::birthday().nullable()),
        ("gender", Field::gender().nullable()),
    ],
};

static CLIENTS_INTERESTS_REQUEST: Schema = Schema {
    name: "ClientsInterestsRequest",
    fields: &[
        ("client_ids", Field::client_ids().required()),
        ("date", Field::date().nullable()),
    ],
};

/// The outer envelope of every call: who is calling, with what credentials,
/// which method and with which arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    pub account: Option<String>,
    pub login: Option<String>,
    pub token: Option<String>,
    pub arguments: Map<String, Value>,
    pub method: String,
}

impl MethodRequest {
    pub fn from_value(raw: &Value) -> Result<Self, MethodError> {
        let valid = Instance::new(&METHOD_REQUEST, raw)?.validated()?;
        Ok(MethodRequest {
            account: valid.text("account"),
            login: valid.text("login"),
            token: valid.text("token"),
            arguments: valid.mapping("arguments").unwrap_or_default(),
            method: valid.text("method").unwrap_or_default(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.login.as_deref() == Some(ADMIN_LOGIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Unknown = 0,
    Male = 1,
    Female = 2,
}

impl TryFrom<i64> for Gender {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Unknown),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Female),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnlineScoreRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<Gender>,
    /// Non-empty fields in declaration order.
    pub filled: Vec<&'static str>,
}

impl OnlineScoreRequest {
    /// Validates the arguments and requires at least one complete pair of
    /// phone/email, first/last name or gender/birthday.
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, MethodError> {
        let raw = Value::Object(arguments.clone());
        let valid = Instance::new(&ONLINE_SCORE_REQUEST, &raw)?.validated()?;

        let request = OnlineScoreRequest {
            first_name: valid.text("first_name"),
            last_name: valid.text("last_name"),
            email: valid.text("email"),
            phone: valid.text("phone"),
            birthday: valid.date("birthday"),
            gender: valid
                .integer("gender")
                .and_then(|gender| Gender::try_from(gender).ok()),
            filled: valid.filled_fields(),
        };

        if !request.has_complete_pair() {
            return Err(MethodError::InvalidRequest(
                "at least one pair of phone-email, first_name-last_name or gender-birthday \
                 must be present with non-empty values"
                    .into(),
            ));
        }

        Ok(request)
    }

    fn has_complete_pair(&self) -> bool {
        (self.phone.is_some() && self.email.is_some())
            || (self.first_name.is_some() && self.last_name.is_some())
            || (self.gender.is_some() && self.birthday.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientsInterestsRequest {
    pub client_ids: Vec<i64>,
    pub date: Option<NaiveDate>,
}

impl ClientsInterestsRequest {
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, MethodError> {
        let raw = Value::Object(arguments.clone());
        let valid = Instance::new(&CLIENTS_INTERESTS_REQUEST, &raw)?.validated()?;
        Ok(ClientsInterestsRequest {
            client_ids: valid.ids("client_ids").unwrap_or_default(),
            date: valid.date("date"),
        })
    }
}
