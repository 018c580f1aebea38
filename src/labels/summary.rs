//! Canonical one-line description of a sample.
//!
//! Token order is fixed: order number (persisted only), company, farm,
//! field, sample name, zone, bag. Names are upper-cased; absent or blank
//! tokens are skipped, the bag token never is.

use crate::references::models::{Company, Farm, Field};
use crate::samples::analysis::describe_tests;
use crate::samples::models::{PersistedSample, SampleDraft};

pub const TOKEN_SEPARATOR: &str = " • ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    pub first_line: String,
    pub test_line: String,
    pub is_quarantine: bool,
}

/// Where the names of a sample come from
#[derive(Debug, Clone, Copy)]
pub enum SummaryContext<'a> {
    /// Joined with the in-memory selections; `bag_id` is the display preview
    Draft {
        company: Option<&'a Company>,
        farm: Option<&'a Farm>,
        field: Option<&'a Field>,
        sample: &'a SampleDraft,
        bag_id: &'a str,
    },
    /// Names already denormalised by the store
    Persisted { sample: &'a PersistedSample },
}

#[derive(Default)]
struct Tokens(Vec<String>);

impl Tokens {
    fn name(&mut self, name: Option<&str>) {
        if let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) {
            self.0.push(name.to_uppercase());
        }
    }

    fn zone(&mut self, zone: Option<&str>) {
        if let Some(zone) = zone.map(str::trim).filter(|zone| !zone.is_empty()) {
            self.0.push(format!("Zone: {zone}"));
        }
    }

    fn finish(mut self, bag_id: &str) -> String {
        self.0.push(format!("Bag: {bag_id}"));
        self.0.join(TOKEN_SEPARATOR)
    }
}

pub fn render_summary(context: &SummaryContext<'_>) -> SampleSummary {
    let mut tokens = Tokens::default();
    match *context {
        SummaryContext::Draft {
            company,
            farm,
            field,
            sample,
            bag_id,
        } => {
            tokens.name(company.map(|company| company.name.as_str()));
            tokens.name(farm.map(|farm| farm.name.as_str()));
            tokens.name(field.map(|field| field.name.as_str()));
            tokens.name(Some(sample.sample_name.as_str()));
            tokens.zone(Some(sample.zone.as_str()));
            SampleSummary {
                first_line: tokens.finish(bag_id),
                test_line: describe_tests(&sample.tests),
                is_quarantine: company.is_some_and(|company| company.is_outside_us),
            }
        }
        SummaryContext::Persisted { sample } => {
            tokens.0.push(format!("Order# {}", sample.batch_id));
            tokens.name(sample.company_name.as_deref());
            tokens.name(sample.farm_name.as_deref());
            tokens.name(sample.field_name.as_deref());
            tokens.name(sample.sample_name.as_deref());
            tokens.zone(sample.zone.as_deref());
            SampleSummary {
                first_line: tokens.finish(&sample.bag_id),
                test_line: describe_tests(&sample.tests),
                is_quarantine: sample.quarantine,
            }
        }
    }
}
