//! List query parameters.
//!
//! Raw `type`, `order_by` and `limit` strings are parsed into closed enums
//! here; only those enums ever reach the query builder, so no client text is
//! placed in clause position.

use sea_orm::Order;

use crate::{EngineError, ResultEngine, records};

/// Direction filter: `IN` keeps inflows (`amount >= 0`), `OUT` outflows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    In,
    Out,
}

impl RecordKind {
    pub fn parse(raw: &str) -> ResultEngine<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            _ => Err(EngineError::InvalidFilter(format!(
                "'{raw}' is not one of IN, OUT"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Amount,
    Date,
}

impl SortColumn {
    pub(crate) fn column(self) -> records::Column {
        match self {
            Self::Id => records::Column::Id,
            Self::Name => records::Column::Name,
            Self::Amount => records::Column::Amount,
            Self::Date => records::Column::Date,
        }
    }
}

impl TryFrom<&str> for SortColumn {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "amount" => Ok(Self::Amount),
            "date" => Ok(Self::Date),
            _ => Err(EngineError::InvalidSort(format!(
                "invalid sorting column '{value}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

impl TryFrom<&str> for SortDirection {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(EngineError::InvalidSort(format!(
                "invalid sorting order '{value}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortOrder {
    /// Parse `column[:direction]`; the direction defaults to ascending.
    pub fn parse(raw: &str) -> ResultEngine<Self> {
        let (column, direction) = match raw.split_once(':') {
            Some((column, direction)) => (column, SortDirection::try_from(direction)?),
            None => (raw, SortDirection::default()),
        };
        Ok(Self {
            column: SortColumn::try_from(column)?,
            direction,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub kind: Option<RecordKind>,
    pub sort: Option<SortOrder>,
    pub limit: Option<u64>,
}

impl ListQuery {
    /// Validate raw query-string values. Empty values count as absent.
    pub fn parse(
        kind: Option<&str>,
        order_by: Option<&str>,
        limit: Option<&str>,
    ) -> ResultEngine<Self> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        Ok(Self {
            kind: present(kind).map(RecordKind::parse).transpose()?,
            sort: present(order_by).map(SortOrder::parse).transpose()?,
            limit: present(limit).map(parse_limit).transpose()?,
        })
    }
}

fn parse_limit(raw: &str) -> ResultEngine<u64> {
    match raw.parse::<u64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(EngineError::InvalidLimit(format!(
            "'{raw}' is not a positive integer"
        ))),
    }
}
