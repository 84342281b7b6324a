//! Lazily evaluated column expressions.
//!
//! A column handle never holds data. It is a JSON expression tree that the
//! engine evaluates when the column is fetched, aggregated or added to a data
//! frame. Three typed wrappers ([`Column`], [`CategoricalColumn`],
//! [`BooleanColumn`]) make sure operators only receive operands of a type the
//! engine accepts, so mistakes like `and`-ing two numeric columns do not
//! compile.

use std::fmt;
use std::ops;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::roles::Role;
use crate::time_stamps::default_time_formats;

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Operator of a virtual column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // Arithmetic
    Plus,
    Minus,
    Multiplies,
    Divides,
    Fmod,
    Pow,
    // Unary math
    Abs,
    Acos,
    Asin,
    Atan,
    Cbrt,
    Ceil,
    Cos,
    Erf,
    Exp,
    Floor,
    Log,
    Round,
    Sin,
    Sqrt,
    Tan,
    /// Gamma function.
    Tgamma,
    /// Log-gamma function.
    Gamma,
    // Time stamp parts
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Weekday,
    Yearday,
    // Comparisons and predicates
    EqualTo,
    NotEqualTo,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Contains,
    IsInf,
    IsNan,
    // Logic
    And,
    Or,
    Xor,
    Not,
    // Strings and conversions
    Concat,
    Substr,
    ToStr,
    ToNum,
    ToTs,
    Update,
    // Generators
    Random,
    Rowid,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Multiplies => "multiplies",
            Self::Divides => "divides",
            Self::Fmod => "fmod",
            Self::Pow => "pow",
            Self::Abs => "abs",
            Self::Acos => "acos",
            Self::Asin => "asin",
            Self::Atan => "atan",
            Self::Cbrt => "cbrt",
            Self::Ceil => "ceil",
            Self::Cos => "cos",
            Self::Erf => "erf",
            Self::Exp => "exp",
            Self::Floor => "floor",
            Self::Log => "log",
            Self::Round => "round",
            Self::Sin => "sin",
            Self::Sqrt => "sqrt",
            Self::Tan => "tan",
            Self::Tgamma => "tgamma",
            Self::Gamma => "gamma",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Weekday => "weekday",
            Self::Yearday => "yearday",
            Self::EqualTo => "equal_to",
            Self::NotEqualTo => "not_equal_to",
            Self::Greater => "greater",
            Self::GreaterEqual => "greater_equal",
            Self::Less => "less",
            Self::LessEqual => "less_equal",
            Self::Contains => "contains",
            Self::IsInf => "is_inf",
            Self::IsNan => "is_nan",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::Concat => "concat",
            Self::Substr => "substr",
            Self::ToStr => "to_str",
            Self::ToNum => "to_num",
            Self::ToTs => "to_ts",
            Self::Update => "update",
            Self::Random => "random",
            Self::Rowid => "rowid",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Expression tree
// ---------------------------------------------------------------------------

/// A column stored in an engine data frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnRef {
    #[serde(rename = "df_name_")]
    pub df_name: String,
    #[serde(rename = "name_")]
    pub name: String,
    #[serde(rename = "role_")]
    pub role: Role,
    #[serde(rename = "unit_", default)]
    pub unit: String,
    /// Name under which the column appears in a joined frame.
    #[serde(rename = "as_", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A column computed by the engine from its operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Virtual {
    #[serde(rename = "df_name_")]
    pub df_name: String,
    #[serde(rename = "operator_")]
    pub operator: Operator,
    #[serde(rename = "operand1_", default, skip_serializing_if = "Option::is_none")]
    pub operand1: Option<Box<Expr>>,
    #[serde(rename = "operand2_", default, skip_serializing_if = "Option::is_none")]
    pub operand2: Option<Box<Expr>>,
    #[serde(rename = "seed_", default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(rename = "begin_", default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<usize>,
    #[serde(rename = "len_", default, skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
    #[serde(rename = "time_formats_", default, skip_serializing_if = "Option::is_none")]
    pub time_formats: Option<Vec<String>>,
    #[serde(rename = "condition_", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Box<Expr>>,
    #[serde(rename = "as_", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Virtual {
    fn new(df_name: &str, operator: Operator, operand1: Option<Expr>, operand2: Option<Expr>) -> Self {
        Self {
            df_name: df_name.to_string(),
            operator,
            operand1: operand1.map(Box::new),
            operand2: operand2.map(Box::new),
            seed: None,
            begin: None,
            len: None,
            time_formats: None,
            condition: None,
            alias: None,
        }
    }
}

/// Any node of a column expression, tagged by `type_` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type_")]
pub enum Expr {
    Column(ColumnRef),
    CategoricalColumn(ColumnRef),
    VirtualColumn(Virtual),
    VirtualCategoricalColumn(Virtual),
    VirtualBooleanColumn(Virtual),
    Value {
        #[serde(rename = "value_")]
        value: f64,
    },
    CategoricalValue {
        #[serde(rename = "value_")]
        value: String,
    },
    BooleanValue {
        #[serde(rename = "value_")]
        value: bool,
    },
}

impl Expr {
    /// Name of the data frame the expression is evaluated on. Empty for literals.
    #[must_use]
    pub fn df_name(&self) -> &str {
        match self {
            Self::Column(column) | Self::CategoricalColumn(column) => &column.df_name,
            Self::VirtualColumn(node)
            | Self::VirtualCategoricalColumn(node)
            | Self::VirtualBooleanColumn(node) => &node.df_name,
            Self::Value { .. } | Self::CategoricalValue { .. } | Self::BooleanValue { .. } => "",
        }
    }

    /// The wire `type_` tag of this node.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Column(_) => "Column",
            Self::CategoricalColumn(_) => "CategoricalColumn",
            Self::VirtualColumn(_) => "VirtualColumn",
            Self::VirtualCategoricalColumn(_) => "VirtualCategoricalColumn",
            Self::VirtualBooleanColumn(_) => "VirtualBooleanColumn",
            Self::Value { .. } => "Value",
            Self::CategoricalValue { .. } => "CategoricalValue",
            Self::BooleanValue { .. } => "BooleanValue",
        }
    }

    /// Whether fetched values should be decoded as time stamps.
    #[must_use]
    pub fn is_time_stamp(&self) -> bool {
        match self {
            Self::Column(column) => {
                column.role == Role::TimeStamp || column.unit.contains("time stamp")
            }
            _ => false,
        }
    }

    fn set_alias(&mut self, name: String) {
        match self {
            Self::Column(column) | Self::CategoricalColumn(column) => column.alias = Some(name),
            Self::VirtualColumn(node)
            | Self::VirtualCategoricalColumn(node)
            | Self::VirtualBooleanColumn(node) => node.alias = Some(name),
            Self::Value { .. } | Self::CategoricalValue { .. } | Self::BooleanValue { .. } => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Operands
// ---------------------------------------------------------------------------

/// Right-hand side accepted by numeric operators: a number or a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericOperand(Expr);

/// Right-hand side accepted by categorical operators: a string or a categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalOperand(Expr);

/// Right-hand side accepted by logical operators: a bool or a boolean column.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanOperand(Expr);

impl From<f64> for NumericOperand {
    fn from(value: f64) -> Self {
        Self(Expr::Value { value })
    }
}

impl From<i32> for NumericOperand {
    fn from(value: i32) -> Self {
        Self(Expr::Value { value: f64::from(value) })
    }
}

impl From<Column> for NumericOperand {
    fn from(column: Column) -> Self {
        Self(column.0)
    }
}

impl From<&Column> for NumericOperand {
    fn from(column: &Column) -> Self {
        Self(column.0.clone())
    }
}

impl From<&str> for CategoricalOperand {
    fn from(value: &str) -> Self {
        Self(Expr::CategoricalValue { value: value.to_string() })
    }
}

impl From<String> for CategoricalOperand {
    fn from(value: String) -> Self {
        Self(Expr::CategoricalValue { value })
    }
}

impl From<CategoricalColumn> for CategoricalOperand {
    fn from(column: CategoricalColumn) -> Self {
        Self(column.0)
    }
}

impl From<&CategoricalColumn> for CategoricalOperand {
    fn from(column: &CategoricalColumn) -> Self {
        Self(column.0.clone())
    }
}

impl From<bool> for BooleanOperand {
    fn from(value: bool) -> Self {
        Self(Expr::BooleanValue { value })
    }
}

impl From<BooleanColumn> for BooleanOperand {
    fn from(column: BooleanColumn) -> Self {
        Self(column.0)
    }
}

impl From<&BooleanColumn> for BooleanOperand {
    fn from(column: &BooleanColumn) -> Self {
        Self(column.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Typed handles
// ---------------------------------------------------------------------------

/// Numeric column handle (`Column` or `VirtualColumn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Column(Expr);

/// String column handle (`CategoricalColumn` or `VirtualCategoricalColumn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CategoricalColumn(Expr);

/// Boolean column handle (`VirtualBooleanColumn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct BooleanColumn(Expr);

fn numeric(df_name: &str, operator: Operator, a: Option<Expr>, b: Option<Expr>) -> Column {
    Column(Expr::VirtualColumn(Virtual::new(df_name, operator, a, b)))
}

fn categorical(df_name: &str, operator: Operator, a: Option<Expr>, b: Option<Expr>) -> CategoricalColumn {
    CategoricalColumn(Expr::VirtualCategoricalColumn(Virtual::new(df_name, operator, a, b)))
}

fn boolean(df_name: &str, operator: Operator, a: Expr, b: Option<Expr>) -> BooleanColumn {
    BooleanColumn(Expr::VirtualBooleanColumn(Virtual::new(df_name, operator, Some(a), b)))
}

fn with_extra(mut expr: Expr, apply: impl FnOnce(&mut Virtual)) -> Expr {
    if let Expr::VirtualColumn(node)
    | Expr::VirtualCategoricalColumn(node)
    | Expr::VirtualBooleanColumn(node) = &mut expr
    {
        apply(node);
    }
    expr
}

macro_rules! unary_numeric {
    ($($(#[$doc:meta])* $method:ident => $operator:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $method(&self) -> Self {
                self.unary(Operator::$operator)
            }
        )*
    };
}

impl Column {
    /// Handle for a stored numeric column.
    #[must_use]
    pub fn stored(df_name: impl Into<String>, name: impl Into<String>, role: Role, unit: impl Into<String>) -> Self {
        Self(Expr::Column(ColumnRef {
            df_name: df_name.into(),
            name: name.into(),
            role,
            unit: unit.into(),
            alias: None,
        }))
    }

    /// Uniformly distributed random numbers in `[0, 1)`.
    #[must_use]
    pub fn random(df_name: &str, seed: u32) -> Self {
        let node = numeric(df_name, Operator::Random, None, None).0;
        Self(with_extra(node, |node| node.seed = Some(seed)))
    }

    /// Row numbers, starting at 0.
    #[must_use]
    pub fn rowid(df_name: &str) -> Self {
        numeric(df_name, Operator::Rowid, None, None)
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.0
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }

    #[must_use]
    pub fn df_name(&self) -> &str {
        self.0.df_name()
    }

    /// Copy of this handle that appears under `name` in joined frames.
    #[must_use]
    pub fn alias(&self, name: impl Into<String>) -> Self {
        let mut expr = self.0.clone();
        expr.set_alias(name.into());
        Self(expr)
    }

    /// Unit of a stored column. Virtual columns carry none.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        match &self.0 {
            Expr::Column(column) => Some(&column.unit),
            _ => None,
        }
    }

    /// The same stored column with another unit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for virtual columns.
    pub fn with_unit(&self, unit: impl Into<String>) -> Result<Self, CoreError> {
        match &self.0 {
            Expr::Column(column) => Ok(Self(Expr::Column(ColumnRef {
                unit: unit.into(),
                ..column.clone()
            }))),
            other => Err(CoreError::Validation(format!(
                "only stored columns carry a unit, got a {}",
                other.type_name()
            ))),
        }
    }

    fn unary(&self, operator: Operator) -> Self {
        numeric(self.df_name(), operator, Some(self.0.clone()), None)
    }

    fn binary(&self, operator: Operator, other: NumericOperand) -> Self {
        numeric(self.df_name(), operator, Some(self.0.clone()), Some(other.0))
    }

    fn compare(&self, operator: Operator, other: NumericOperand) -> BooleanColumn {
        boolean(self.df_name(), operator, self.0.clone(), Some(other.0))
    }

    unary_numeric! {
        abs => Abs,
        acos => Acos,
        asin => Asin,
        atan => Atan,
        cbrt => Cbrt,
        ceil => Ceil,
        cos => Cos,
        erf => Erf,
        exp => Exp,
        floor => Floor,
        log => Log,
        round => Round,
        sin => Sin,
        sqrt => Sqrt,
        tan => Tan,
        /// Gamma function.
        gamma => Tgamma,
        /// Natural logarithm of the gamma function.
        lgamma => Gamma,
        year => Year,
        month => Month,
        /// Day of the month.
        day => Day,
        hour => Hour,
        minute => Minute,
        second => Second,
        weekday => Weekday,
        /// Day of the year.
        yearday => Yearday,
    }

    #[must_use]
    pub fn pow(&self, exponent: impl Into<NumericOperand>) -> Self {
        self.binary(Operator::Pow, exponent.into())
    }

    #[must_use]
    pub fn equal_to(&self, other: impl Into<NumericOperand>) -> BooleanColumn {
        self.compare(Operator::EqualTo, other.into())
    }

    #[must_use]
    pub fn not_equal_to(&self, other: impl Into<NumericOperand>) -> BooleanColumn {
        self.compare(Operator::NotEqualTo, other.into())
    }

    #[must_use]
    pub fn greater(&self, other: impl Into<NumericOperand>) -> BooleanColumn {
        self.compare(Operator::Greater, other.into())
    }

    #[must_use]
    pub fn greater_equal(&self, other: impl Into<NumericOperand>) -> BooleanColumn {
        self.compare(Operator::GreaterEqual, other.into())
    }

    #[must_use]
    pub fn less(&self, other: impl Into<NumericOperand>) -> BooleanColumn {
        self.compare(Operator::Less, other.into())
    }

    #[must_use]
    pub fn less_equal(&self, other: impl Into<NumericOperand>) -> BooleanColumn {
        self.compare(Operator::LessEqual, other.into())
    }

    #[must_use]
    pub fn is_inf(&self) -> BooleanColumn {
        boolean(self.df_name(), Operator::IsInf, self.0.clone(), None)
    }

    #[must_use]
    pub fn is_nan(&self) -> BooleanColumn {
        boolean(self.df_name(), Operator::IsNan, self.0.clone(), None)
    }

    #[must_use]
    pub fn to_str(&self) -> CategoricalColumn {
        categorical(self.df_name(), Operator::ToStr, Some(self.0.clone()), None)
    }

    /// Replace entries where `condition` holds with the matching entry of `values`.
    #[must_use]
    pub fn update(&self, condition: &BooleanColumn, values: impl Into<NumericOperand>) -> Self {
        let node = self.binary(Operator::Update, values.into()).0;
        Self(with_extra(node, |node| node.condition = Some(Box::new(condition.0.clone()))))
    }

    #[must_use]
    pub fn assert_equal(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::AssertEqual)
    }

    #[must_use]
    pub fn avg(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Avg)
    }

    #[must_use]
    pub fn count(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Count)
    }

    #[must_use]
    pub fn max(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Max)
    }

    #[must_use]
    pub fn median(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Median)
    }

    #[must_use]
    pub fn min(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Min)
    }

    #[must_use]
    pub fn stddev(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Stddev)
    }

    #[must_use]
    pub fn sum(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Sum)
    }

    #[must_use]
    pub fn var(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::Var)
    }
}

impl CategoricalColumn {
    /// Handle for a stored categorical column or join key.
    #[must_use]
    pub fn stored(df_name: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self(Expr::CategoricalColumn(ColumnRef {
            df_name: df_name.into(),
            name: name.into(),
            role,
            unit: String::new(),
            alias: None,
        }))
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.0
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }

    #[must_use]
    pub fn df_name(&self) -> &str {
        self.0.df_name()
    }

    #[must_use]
    pub fn alias(&self, name: impl Into<String>) -> Self {
        let mut expr = self.0.clone();
        expr.set_alias(name.into());
        Self(expr)
    }

    fn compare(&self, operator: Operator, other: CategoricalOperand) -> BooleanColumn {
        boolean(self.df_name(), operator, self.0.clone(), Some(other.0))
    }

    #[must_use]
    pub fn equal_to(&self, other: impl Into<CategoricalOperand>) -> BooleanColumn {
        self.compare(Operator::EqualTo, other.into())
    }

    #[must_use]
    pub fn not_equal_to(&self, other: impl Into<CategoricalOperand>) -> BooleanColumn {
        self.compare(Operator::NotEqualTo, other.into())
    }

    /// Whether `other` occurs in each entry.
    #[must_use]
    pub fn contains(&self, other: impl Into<CategoricalOperand>) -> BooleanColumn {
        self.compare(Operator::Contains, other.into())
    }

    /// Substring of `len` characters starting at `begin`.
    #[must_use]
    pub fn substr(&self, begin: usize, len: usize) -> Self {
        let node = categorical(self.df_name(), Operator::Substr, Some(self.0.clone()), None).0;
        Self(with_extra(node, |node| {
            node.begin = Some(begin);
            node.len = Some(len);
        }))
    }

    #[must_use]
    pub fn to_num(&self) -> Column {
        numeric(self.df_name(), Operator::ToNum, Some(self.0.clone()), None)
    }

    /// Parse each entry as a time stamp. `None` uses the default engine formats.
    #[must_use]
    pub fn to_ts(&self, time_formats: Option<Vec<String>>) -> Column {
        let node = numeric(self.df_name(), Operator::ToTs, Some(self.0.clone()), None).0;
        let formats = time_formats.unwrap_or_else(default_time_formats);
        Column(with_extra(node, |node| node.time_formats = Some(formats)))
    }

    #[must_use]
    pub fn update(&self, condition: &BooleanColumn, values: impl Into<CategoricalOperand>) -> Self {
        let node = categorical(
            self.df_name(),
            Operator::Update,
            Some(self.0.clone()),
            Some(values.into().0),
        )
        .0;
        Self(with_extra(node, |node| node.condition = Some(Box::new(condition.0.clone()))))
    }

    #[must_use]
    pub fn count(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::CountCategorical)
    }

    #[must_use]
    pub fn count_distinct(&self) -> ColumnAggregation {
        ColumnAggregation::new(self.0.clone(), AggregationKind::CountDistinct)
    }
}

impl BooleanColumn {
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.0
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }

    #[must_use]
    pub fn df_name(&self) -> &str {
        self.0.df_name()
    }

    fn logical(&self, operator: Operator, other: Option<BooleanOperand>) -> Self {
        boolean(self.df_name(), operator, self.0.clone(), other.map(|other| other.0))
    }

    #[must_use]
    pub fn equal_to(&self, other: impl Into<BooleanOperand>) -> Self {
        self.logical(Operator::EqualTo, Some(other.into()))
    }

    #[must_use]
    pub fn not_equal_to(&self, other: impl Into<BooleanOperand>) -> Self {
        self.logical(Operator::NotEqualTo, Some(other.into()))
    }

    /// Inverts the column.
    #[must_use]
    pub fn is_false(&self) -> Self {
        self.logical(Operator::Not, None)
    }

    #[must_use]
    pub fn to_str(&self) -> CategoricalColumn {
        categorical(self.df_name(), Operator::ToStr, Some(self.0.clone()), None)
    }
}

// ---------------------------------------------------------------------------
// Operator overloads
// ---------------------------------------------------------------------------

macro_rules! numeric_binary_op {
    ($trait:ident, $method:ident, $operator:ident) => {
        impl<T: Into<NumericOperand>> ops::$trait<T> for Column {
            type Output = Self;

            fn $method(self, rhs: T) -> Self {
                self.binary(Operator::$operator, rhs.into())
            }
        }

        impl<T: Into<NumericOperand>> ops::$trait<T> for &Column {
            type Output = Column;

            fn $method(self, rhs: T) -> Column {
                self.binary(Operator::$operator, rhs.into())
            }
        }

        impl ops::$trait<Column> for f64 {
            type Output = Column;

            fn $method(self, rhs: Column) -> Column {
                let df_name = rhs.df_name().to_string();
                numeric(&df_name, Operator::$operator, Some(Expr::Value { value: self }), Some(rhs.0))
            }
        }
    };
}

numeric_binary_op!(Add, add, Plus);
numeric_binary_op!(Sub, sub, Minus);
numeric_binary_op!(Mul, mul, Multiplies);
numeric_binary_op!(Div, div, Divides);
numeric_binary_op!(Rem, rem, Fmod);

impl ops::Neg for Column {
    type Output = Self;

    fn neg(self) -> Self {
        self.binary(Operator::Multiplies, NumericOperand::from(-1.0))
    }
}

impl ops::Neg for &Column {
    type Output = Column;

    fn neg(self) -> Column {
        self.binary(Operator::Multiplies, NumericOperand::from(-1.0))
    }
}

impl<T: Into<CategoricalOperand>> ops::Add<T> for CategoricalColumn {
    type Output = Self;

    fn add(self, rhs: T) -> Self {
        let df_name = self.df_name().to_string();
        categorical(&df_name, Operator::Concat, Some(self.0), Some(rhs.into().0))
    }
}

impl<T: Into<CategoricalOperand>> ops::Add<T> for &CategoricalColumn {
    type Output = CategoricalColumn;

    fn add(self, rhs: T) -> CategoricalColumn {
        categorical(self.df_name(), Operator::Concat, Some(self.0.clone()), Some(rhs.into().0))
    }
}

impl ops::Add<CategoricalColumn> for &str {
    type Output = CategoricalColumn;

    fn add(self, rhs: CategoricalColumn) -> CategoricalColumn {
        let lhs = Expr::CategoricalValue { value: self.to_string() };
        let df_name = rhs.df_name().to_string();
        categorical(&df_name, Operator::Concat, Some(lhs), Some(rhs.0))
    }
}

macro_rules! boolean_binary_op {
    ($trait:ident, $method:ident, $operator:ident) => {
        impl<T: Into<BooleanOperand>> ops::$trait<T> for BooleanColumn {
            type Output = Self;

            fn $method(self, rhs: T) -> Self {
                self.logical(Operator::$operator, Some(rhs.into()))
            }
        }

        impl<T: Into<BooleanOperand>> ops::$trait<T> for &BooleanColumn {
            type Output = BooleanColumn;

            fn $method(self, rhs: T) -> BooleanColumn {
                self.logical(Operator::$operator, Some(rhs.into()))
            }
        }
    };
}

boolean_binary_op!(BitAnd, bitand, And);
boolean_binary_op!(BitOr, bitor, Or);
boolean_binary_op!(BitXor, bitxor, Xor);

impl ops::Not for BooleanColumn {
    type Output = Self;

    fn not(self) -> Self {
        self.is_false()
    }
}

impl ops::Not for &BooleanColumn {
    type Output = BooleanColumn;

    fn not(self) -> BooleanColumn {
        self.is_false()
    }
}

// ---------------------------------------------------------------------------
// Column aggregations
// ---------------------------------------------------------------------------

/// Aggregation evaluated over a whole column by `Column.aggregate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    /// Fails in the engine unless all values are equal.
    AssertEqual,
    Avg,
    Count,
    CountCategorical,
    CountDistinct,
    Max,
    Median,
    Min,
    Stddev,
    Sum,
    Var,
}

/// An aggregation over a column, with the alias of the resulting column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnAggregation {
    #[serde(rename = "as_")]
    pub alias: String,
    #[serde(rename = "col_")]
    pub col: Expr,
    #[serde(rename = "type_")]
    pub kind: AggregationKind,
}

impl ColumnAggregation {
    pub const DEFAULT_ALIAS: &'static str = "new_column";

    #[must_use]
    pub fn new(col: Expr, kind: AggregationKind) -> Self {
        Self {
            alias: Self::DEFAULT_ALIAS.to_string(),
            col,
            kind,
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    #[must_use]
    pub fn df_name(&self) -> &str {
        self.col.df_name()
    }
}
