//! This file defines the type `ExpenseRecord`, the record shown in the expense list, and the
//! closed set of categories used to classify and filter expenses.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, macros::date};

/// Alias for the integer type the server uses for expense IDs.
pub type ExpenseId = i64;

pub(crate) mod date_format {
    //! Serializes a [time::Date] as an ISO 8601 calendar date, e.g. "2024-01-31".
    //!
    //! The default serializer for [time::Date] writes a `(year, ordinal)` tuple, which the backend
    //! does not understand.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    /// Format `date` as "YYYY-MM-DD".
    pub fn format(date: Date) -> String {
        // Formatting with a fixed description of date components cannot fail for a `Date`.
        date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
    }

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The category an expense belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Food and dining.
    Food,
    /// Rent, mortgage and property costs.
    Housing,
    /// Fuel, public transport and rideshare.
    Transportation,
    /// Electricity, water, internet and phone.
    Utilities,
    /// Movies, games and subscriptions.
    Entertainment,
    /// Medical and health costs.
    Healthcare,
    /// Courses, books and training.
    Education,
    /// Personal care items and services.
    PersonalCare,
    /// Anything that does not fit another category.
    Miscellaneous,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Housing,
        Category::Transportation,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Education,
        Category::PersonalCare,
        Category::Miscellaneous,
    ];

    /// The value the backend uses for this category, e.g. "PERSONAL_CARE".
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Housing => "HOUSING",
            Self::Transportation => "TRANSPORTATION",
            Self::Utilities => "UTILITIES",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Healthcare => "HEALTHCARE",
            Self::Education => "EDUCATION",
            Self::PersonalCare => "PERSONAL_CARE",
            Self::Miscellaneous => "MISCELLANEOUS",
        }
    }

    /// A human readable name for the category.
    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Housing => "Housing",
            Self::Transportation => "Transportation",
            Self::Utilities => "Utilities",
            Self::Entertainment => "Entertainment",
            Self::Healthcare => "Healthcare",
            Self::Education => "Education",
            Self::PersonalCare => "Personal Care",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    /// An emoji shown next to the category name.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Food => "🍽️",
            Self::Housing => "🏠",
            Self::Transportation => "🚗",
            Self::Utilities => "💡",
            Self::Entertainment => "🎬",
            Self::Healthcare => "🏥",
            Self::Education => "📚",
            Self::PersonalCare => "💄",
            Self::Miscellaneous => "📦",
        }
    }

    /// The icon for a raw category value, falling back to the miscellaneous icon for values
    /// this client does not know about.
    pub fn icon_for(value: &str) -> &'static str {
        value
            .parse::<Category>()
            .unwrap_or(Category::Miscellaneous)
            .icon()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The string did not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a known category")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Parses either the backend value ("PERSONAL_CARE") or the label ("Personal Care"),
    /// ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        Category::ALL
            .into_iter()
            .find(|category| {
                category.as_query_value().eq_ignore_ascii_case(trimmed)
                    || category.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

/// An expense as stored on the server.
///
/// Records are only ever created, changed and deleted through the
/// [ExpenseService](crate::ExpenseService). The list keeps whole records and
/// replaces them, so there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    id: ExpenseId,
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "date_format")]
    date: Date,
    category: Category,
}

impl ExpenseRecord {
    /// Create a record for an expense the server has assigned `id` to.
    pub fn new(id: ExpenseId, expense: NewExpense) -> Self {
        Self {
            id,
            description: expense.description,
            amount: expense.amount,
            date: expense.date,
            category: expense.category,
        }
    }

    /// The server-assigned ID of the expense.
    pub fn id(&self) -> ExpenseId {
        self.id
    }

    /// What the money was spent on.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// How much was spent.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// When the money was spent.
    pub fn date(&self) -> Date {
        self.date
    }

    /// The category of the expense.
    pub fn category(&self) -> Category {
        self.category
    }
}

/// The reasons a [NewExpense] may be rejected before it is sent to the server.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The description was empty or only whitespace.
    #[error("the description must not be empty")]
    BlankDescription,

    /// The amount was less than one cent.
    #[error("{0} is less than the minimum amount of 0.01")]
    AmountTooSmall(Decimal),

    /// The date was before the earliest date the tracker accepts.
    #[error("{0} is before 2020-01-01, the earliest allowed date")]
    DateTooEarly(Date),

    /// The date was in the future.
    ///
    /// Expenses record money that has already been spent, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),
}

/// The smallest amount an expense may have.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The earliest date an expense may have.
pub const MIN_DATE: Date = date!(2020 - 01 - 01);

/// The payload for creating or updating an expense.
///
/// To create a `NewExpense`, use [NewExpense::build], which validates the fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpense {
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "date_format")]
    date: Date,
    category: Category,
}

impl NewExpense {
    /// Validate the fields of a new expense against today's date.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the description is blank, the amount is
    /// less than [MIN_AMOUNT], or the date is before [MIN_DATE] or in the future.
    pub fn build(
        description: &str,
        amount: Decimal,
        date: Date,
        category: Category,
    ) -> Result<Self, ValidationError> {
        Self::build_as_of(description, amount, date, category, today())
    }

    /// Same as [NewExpense::build] with an explicit date for "today".
    pub fn build_as_of(
        description: &str,
        amount: Decimal,
        date: Date,
        category: Category,
        today: Date,
    ) -> Result<Self, ValidationError> {
        let description = description.trim();

        if description.is_empty() {
            return Err(ValidationError::BlankDescription);
        }

        if amount < MIN_AMOUNT {
            return Err(ValidationError::AmountTooSmall(amount));
        }

        if date < MIN_DATE {
            return Err(ValidationError::DateTooEarly(date));
        }

        if date > today {
            return Err(ValidationError::FutureDate(date));
        }

        Ok(Self {
            description: description.to_owned(),
            amount,
            date,
            category,
        })
    }

    /// Create a new expense without validating it, e.g. for seeding a test backend.
    #[cfg(test)]
    pub(crate) fn new_unchecked(
        description: &str,
        amount: Decimal,
        date: Date,
        category: Category,
    ) -> Self {
        Self {
            description: description.to_owned(),
            amount,
            date,
            category,
        }
    }
}

/// Today's date in the local timezone, or in UTC if the local offset cannot be determined.
fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}
