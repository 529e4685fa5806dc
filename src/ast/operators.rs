use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, QuarryResult};

/// SQL operators accepted by comparison, arithmetic and unary expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    DoubleEq,
    Ne,
    NotEqual,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Is,
    IsNot,
    Like,
    NotLike,
    ILike,
    NotILike,
    Match,
    Contains,
    ContainedBy,
    StartsWith,
    Overlaps,
    HasKey,
    HasAllKeys,
    HasAnyKey,
    NotLt,
    NotGt,
    NullSafeEq,
    Regex,
    RegexI,
    NotRegex,
    NotRegexI,
    TextSearch,
    TextSearchIndex,
    DoubleBang,
    Distance,
    Regexp,
    IsDistinctFrom,
    IsNotDistinctFrom,
    Between,
    BetweenSymmetric,
    NotBetween,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    JsonGet,
    JsonGetText,
    // Unary
    Not,
    Exists,
    NotExists,
    Negate,
}

const BINARY_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::DoubleEq,
    Operator::Ne,
    Operator::NotEqual,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::In,
    Operator::NotIn,
    Operator::Is,
    Operator::IsNot,
    Operator::Like,
    Operator::NotLike,
    Operator::ILike,
    Operator::NotILike,
    Operator::Match,
    Operator::Contains,
    Operator::ContainedBy,
    Operator::StartsWith,
    Operator::Overlaps,
    Operator::HasKey,
    Operator::HasAllKeys,
    Operator::HasAnyKey,
    Operator::NotLt,
    Operator::NotGt,
    Operator::NullSafeEq,
    Operator::Regex,
    Operator::RegexI,
    Operator::NotRegex,
    Operator::NotRegexI,
    Operator::TextSearch,
    Operator::TextSearchIndex,
    Operator::DoubleBang,
    Operator::Distance,
    Operator::Regexp,
    Operator::IsDistinctFrom,
    Operator::IsNotDistinctFrom,
    Operator::Between,
    Operator::BetweenSymmetric,
    Operator::NotBetween,
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Mod,
    Operator::Pow,
    Operator::Concat,
    Operator::BitAnd,
    Operator::BitOr,
    Operator::BitXor,
    Operator::ShiftLeft,
    Operator::ShiftRight,
    Operator::JsonGet,
    Operator::JsonGetText,
];

const UNARY_OPERATORS: &[Operator] = &[
    Operator::Not,
    Operator::Exists,
    Operator::NotExists,
    Operator::Negate,
];

impl Operator {
    /// The operator as written in SQL.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::DoubleEq => "==",
            Operator::Ne => "!=",
            Operator::NotEqual => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::ILike => "ilike",
            Operator::NotILike => "not ilike",
            Operator::Match => "match",
            Operator::Contains => "@>",
            Operator::ContainedBy => "<@",
            Operator::StartsWith => "^@",
            Operator::Overlaps => "&&",
            Operator::HasKey => "?",
            Operator::HasAllKeys => "?&",
            Operator::HasAnyKey => "?|",
            Operator::NotLt => "!<",
            Operator::NotGt => "!>",
            Operator::NullSafeEq => "<=>",
            Operator::Regex => "~",
            Operator::RegexI => "~*",
            Operator::NotRegex => "!~",
            Operator::NotRegexI => "!~*",
            Operator::TextSearch => "@@",
            Operator::TextSearchIndex => "@@@",
            Operator::DoubleBang => "!!",
            Operator::Distance => "<->",
            Operator::Regexp => "regexp",
            Operator::IsDistinctFrom => "is distinct from",
            Operator::IsNotDistinctFrom => "is not distinct from",
            Operator::Between => "between",
            Operator::BetweenSymmetric => "between symmetric",
            Operator::NotBetween => "not between",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "^",
            Operator::Concat => "||",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "#",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::JsonGet => "->",
            Operator::JsonGetText => "->>",
            Operator::Not => "not",
            Operator::Exists => "exists",
            Operator::NotExists => "not exists",
            Operator::Negate => "-",
        }
    }

    /// Parse a binary operator. Unknown input is a hard error naming the input.
    pub fn parse_binary(input: &str) -> QuarryResult<Self> {
        Self::lookup(BINARY_OPERATORS, input)
    }

    /// Parse a unary operator (`not`, `exists`, `not exists`, `-`).
    pub fn parse_unary(input: &str) -> QuarryResult<Self> {
        Self::lookup(UNARY_OPERATORS, input)
    }

    fn lookup(table: &[Operator], input: &str) -> QuarryResult<Self> {
        let normalized = input.trim().to_lowercase();
        table
            .iter()
            .copied()
            .find(|op| op.sql_symbol() == normalized)
            .ok_or_else(|| QuarryError::InvalidOperator(input.to_string()))
    }

    /// `=` and `==`.
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq | Operator::DoubleEq)
    }

    /// `!=` and `<>`.
    pub fn is_inequality(&self) -> bool {
        matches!(self, Operator::Ne | Operator::NotEqual)
    }

    pub fn is_unary(&self) -> bool {
        UNARY_OPERATORS.contains(self)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql_symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    LateralInner,
    LateralLeft,
}

impl JoinType {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner join",
            JoinType::Left => "left join",
            JoinType::Right => "right join",
            JoinType::Full => "full join",
            JoinType::Cross => "cross join",
            JoinType::LateralInner => "inner join lateral",
            JoinType::LateralLeft => "left join lateral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }

    /// Exactly `asc` or `desc`.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "asc" => Some(OrderDirection::Asc),
            "desc" => Some(OrderDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SetOperator::Union => "union",
            SetOperator::Intersect => "intersect",
            SetOperator::Except => "except",
        }
    }
}

/// Select modifiers, rendered before (distinct) or after (locking) the query body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectModifier {
    Distinct,
    ForUpdate,
    ForShare,
    ForKeyShare,
    ForNoKeyUpdate,
    NoWait,
    SkipLocked,
}

impl SelectModifier {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SelectModifier::Distinct => "distinct",
            SelectModifier::ForUpdate => "for update",
            SelectModifier::ForShare => "for share",
            SelectModifier::ForKeyShare => "for key share",
            SelectModifier::ForNoKeyUpdate => "for no key update",
            SelectModifier::NoWait => "nowait",
            SelectModifier::SkipLocked => "skip locked",
        }
    }

    /// Sort key: lock strength precedes `nowait` / `skip locked`.
    pub fn priority(&self) -> u8 {
        match self {
            SelectModifier::Distinct => 0,
            SelectModifier::ForUpdate
            | SelectModifier::ForShare
            | SelectModifier::ForKeyShare
            | SelectModifier::ForNoKeyUpdate => 1,
            SelectModifier::NoWait | SelectModifier::SkipLocked => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchModifier {
    Only,
    WithTies,
}

impl FetchModifier {
    pub fn parse(input: &str) -> QuarryResult<Self> {
        match input.trim() {
            "only" => Ok(FetchModifier::Only),
            "with ties" => Ok(FetchModifier::WithTies),
            other => Err(QuarryError::Validation(format!(
                "invalid fetch modifier '{}'. Expected: only or with ties",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopModifier {
    Percent,
    WithTies,
    PercentWithTies,
}

impl TopModifier {
    pub fn parse(input: &str) -> QuarryResult<Self> {
        match input.trim() {
            "percent" => Ok(TopModifier::Percent),
            "with ties" => Ok(TopModifier::WithTies),
            "percent with ties" => Ok(TopModifier::PercentWithTies),
            other => Err(QuarryError::Validation(format!(
                "invalid top modifier '{}'. Expected: percent, with ties or percent with ties",
                other
            ))),
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            TopModifier::Percent => "percent",
            TopModifier::WithTies => "with ties",
            TopModifier::PercentWithTies => "percent with ties",
        }
    }
}

/// `on delete` / `on update` action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn parse(input: &str) -> QuarryResult<Self> {
        match input.trim().to_lowercase().as_str() {
            "cascade" => Ok(ReferentialAction::Cascade),
            "set null" => Ok(ReferentialAction::SetNull),
            "set default" => Ok(ReferentialAction::SetDefault),
            "restrict" => Ok(ReferentialAction::Restrict),
            "no action" => Ok(ReferentialAction::NoAction),
            _ => Err(QuarryError::Validation(format!(
                "invalid referential action '{}'",
                input
            ))),
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "set null",
            ReferentialAction::SetDefault => "set default",
            ReferentialAction::Restrict => "restrict",
            ReferentialAction::NoAction => "no action",
        }
    }
}

/// `on commit` behaviour of temporary tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnCommitAction {
    PreserveRows,
    DeleteRows,
    Drop,
}

impl OnCommitAction {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            OnCommitAction::PreserveRows => "preserve rows",
            OnCommitAction::DeleteRows => "delete rows",
            OnCommitAction::Drop => "drop",
        }
    }
}
