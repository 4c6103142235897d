//! Invoice and payment filters, rendered as bound predicates.
use crate::query::QueryError;
use std::fmt::Display;

/// Days since the invoice date.
const DAYS_PASSED: &str = "date_diff('day', TR.refDate, current_date)";

/// Credit days granted to the party.
const CREDIT_DAYS: &str = "M_PARTY.Days";

const PAYMENT_TERMS: &str = "TR.PaymentTerms";
const TERMS: &str = "TR.Terms";

/// Comparison operators available to filters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Lt,
    Gt,
}

impl Operator {
    const fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
        }
    }
}

/// Side of a comparison. Expressions are fixed SQL owned by this module,
/// literals are always bound as parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Expression(&'static str),
    Literal(String),
}

/// Predicate tree appended to the base `WHERE` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterNode {
    /// No restriction
    Empty,
    Comparison {
        left: Operand,
        operator: Operator,
        right: Operand,
    },
    Not(Box<FilterNode>),
}

impl FilterNode {
    fn compare(left: Operand, operator: Operator, right: Operand) -> FilterNode {
        FilterNode::Comparison { left, operator, right }
    }

    fn negate(self) -> FilterNode {
        match self {
            FilterNode::Empty => FilterNode::Empty,
            node => FilterNode::Not(Box::new(node)),
        }
    }

    /// Appends ` AND <predicate>` to `sql`, pushing literal values to `params`.
    pub(crate) fn render(&self, sql: &mut String, params: &mut Vec<String>) {
        if *self != FilterNode::Empty {
            sql.push_str("\n  AND ");
            self.render_predicate(sql, params);
        }
    }

    fn render_predicate(&self, sql: &mut String, params: &mut Vec<String>) {
        match self {
            FilterNode::Empty => sql.push_str("TRUE"),
            FilterNode::Comparison { left, operator, right } => {
                render_operand(left, sql, params);
                sql.push(' ');
                sql.push_str(operator.as_sql());
                sql.push(' ');
                render_operand(right, sql, params);
            }
            FilterNode::Not(node) => {
                sql.push_str("NOT (");
                node.render_predicate(sql, params);
                sql.push(')');
            }
        }
    }
}

fn render_operand(operand: &Operand, sql: &mut String, params: &mut Vec<String>) {
    match operand {
        Operand::Expression(expression) => sql.push_str(expression),
        Operand::Literal(value) => {
            sql.push_str("CAST(? AS VARCHAR)");
            params.push(value.to_owned());
        }
    }
}

/// Literal values compared against by the filters, overridable from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterLiterals {
    pub no_credit: String,
    pub removed_no_credit: String,
    pub cash: String,
    pub cheque: String,
}

impl Default for FilterLiterals {
    fn default() -> Self {
        FilterLiterals {
            no_credit: "No Credit".to_owned(),
            removed_no_credit: "No Credit".to_owned(),
            cash: "CASH".to_owned(),
            cheque: "cheque".to_owned(),
        }
    }
}

/// Invoice record type selection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InvoiceFilter {
    #[default]
    All,
    /// Still within the credit period
    Remaining,
    /// Past the credit period
    OverCredit,
    NoCredit,
    RemovedRemaining,
    RemovedOverCredit,
    RemovedNoCredit,
}

impl InvoiceFilter {
    pub const ALL: [InvoiceFilter; 7] = [
        InvoiceFilter::All,
        InvoiceFilter::Remaining,
        InvoiceFilter::OverCredit,
        InvoiceFilter::NoCredit,
        InvoiceFilter::RemovedRemaining,
        InvoiceFilter::RemovedOverCredit,
        InvoiceFilter::RemovedNoCredit,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            InvoiceFilter::All => "All",
            InvoiceFilter::Remaining => "Remaining",
            InvoiceFilter::OverCredit => "Over Credit",
            InvoiceFilter::NoCredit => "No Credit",
            InvoiceFilter::RemovedRemaining => "Removed Remaining",
            InvoiceFilter::RemovedOverCredit => "Remove Over Credit",
            InvoiceFilter::RemovedNoCredit => "Remove No Credit",
        }
    }

    /// Looks a filter up by its label, ignoring case.
    pub fn from_label(label: &str) -> Result<InvoiceFilter, QueryError> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.label().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| QueryError::UnknownFilter(label.to_owned()))
    }

    pub fn to_node(&self, literals: &FilterLiterals) -> FilterNode {
        let days = || Operand::Expression(DAYS_PASSED);
        let credit = || Operand::Expression(CREDIT_DAYS);
        let terms = || Operand::Expression(PAYMENT_TERMS);
        match self {
            InvoiceFilter::All => FilterNode::Empty,
            InvoiceFilter::Remaining => FilterNode::compare(days(), Operator::Lt, credit()),
            InvoiceFilter::OverCredit => FilterNode::compare(days(), Operator::Gt, credit()),
            InvoiceFilter::NoCredit => {
                FilterNode::compare(terms(), Operator::Eq, Operand::Literal(literals.no_credit.to_owned()))
            }
            InvoiceFilter::RemovedRemaining => InvoiceFilter::Remaining.to_node(literals).negate(),
            InvoiceFilter::RemovedOverCredit => InvoiceFilter::OverCredit.to_node(literals).negate(),
            InvoiceFilter::RemovedNoCredit => {
                FilterNode::compare(terms(), Operator::Eq, Operand::Literal(literals.removed_no_credit.to_owned()))
                    .negate()
            }
        }
    }
}

impl Display for InvoiceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment terms selection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PaymentFilter {
    #[default]
    All,
    Cash,
    Cheque,
}

impl PaymentFilter {
    pub const ALL: [PaymentFilter; 3] = [PaymentFilter::All, PaymentFilter::Cash, PaymentFilter::Cheque];

    pub const fn label(&self) -> &'static str {
        match self {
            PaymentFilter::All => "All",
            PaymentFilter::Cash => "Cash",
            PaymentFilter::Cheque => "Cheque",
        }
    }

    pub fn from_label(label: &str) -> Result<PaymentFilter, QueryError> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.label().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| QueryError::UnknownFilter(label.to_owned()))
    }

    pub fn to_node(&self, literals: &FilterLiterals) -> FilterNode {
        let terms = Operand::Expression(TERMS);
        match self {
            PaymentFilter::All => FilterNode::Empty,
            PaymentFilter::Cash => FilterNode::compare(terms, Operator::Eq, Operand::Literal(literals.cash.to_owned())),
            PaymentFilter::Cheque => FilterNode::compare(terms, Operator::Eq, Operand::Literal(literals.cheque.to_owned())),
        }
    }
}

impl Display for PaymentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
