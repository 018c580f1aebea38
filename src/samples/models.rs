use crate::common::errors::{PortalError, PortalResult};
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId, SampleId, null_as_default};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimeType {
    #[serde(rename = "Calcium Carbonate")]
    CalciumCarbonate,
    Dolomite,
    Gypsum,
}

impl LimeType {
    pub const ALL: [LimeType; 3] = [
        LimeType::CalciumCarbonate,
        LimeType::Dolomite,
        LimeType::Gypsum,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LimeType::CalciumCarbonate => "Calcium Carbonate",
            LimeType::Dolomite => "Dolomite",
            LimeType::Gypsum => "Gypsum",
        }
    }
}

impl fmt::Display for LimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One lime application. Entries are appended or removed, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimeEntry {
    #[serde(rename = "type")]
    pub lime_type: LimeType,
    pub month: u8,
    pub year: i32,
    pub amount_lbs_ac: Decimal,
}

impl LimeEntry {
    /// Builds an entry from form input; the amount must be a number above zero
    pub fn parse(lime_type: LimeType, month: u8, year: i32, amount: &str) -> PortalResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(PortalError::InvalidLimeEntry {
                field: "month".to_string(),
                message: format!("{month} is not a month (1-12)"),
            });
        }
        let amount_lbs_ac = parse_decimal(amount)
            .filter(|value| *value > Decimal::ZERO)
            .ok_or_else(|| PortalError::InvalidLimeEntry {
                field: "amount_lbs_ac".to_string(),
                message: format!("'{}' is not a positive amount", amount.trim()),
            })?;
        Ok(Self {
            lime_type,
            month,
            year,
            amount_lbs_ac,
        })
    }
}

impl fmt::Display for LimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}/{} {} lbs/ac",
            self.lime_type,
            self.month,
            self.year,
            self.amount_lbs_ac.normalize()
        )
    }
}

/// Fertilizer-recommendation intensity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProgramLevel {
    #[default]
    Excellent,
    Building,
    Minimal,
}

impl fmt::Display for ProgramLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgramLevel::Excellent => "Excellent",
            ProgramLevel::Building => "Building",
            ProgramLevel::Minimal => "Minimal",
        })
    }
}

/// Tests run on every sample; never user-editable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardTest {
    B,
    Ca,
    Cu,
    Fe,
    K,
    Mg,
    Mn,
    Na,
    Om,
    P2,
    Ph,
    S,
    Zn,
}

impl StandardTest {
    pub const ALL: [StandardTest; 13] = [
        StandardTest::B,
        StandardTest::Ca,
        StandardTest::Cu,
        StandardTest::Fe,
        StandardTest::K,
        StandardTest::Mg,
        StandardTest::Mn,
        StandardTest::Na,
        StandardTest::Om,
        StandardTest::P2,
        StandardTest::Ph,
        StandardTest::S,
        StandardTest::Zn,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StandardTest::B => "B",
            StandardTest::Ca => "Ca",
            StandardTest::Cu => "Cu",
            StandardTest::Fe => "Fe",
            StandardTest::K => "K",
            StandardTest::Mg => "Mg",
            StandardTest::Mn => "Mn",
            StandardTest::Na => "Na",
            StandardTest::Om => "OM",
            StandardTest::P2 => "P2",
            StandardTest::Ph => "pH",
            StandardTest::S => "S",
            StandardTest::Zn => "Zn",
        }
    }
}

/// User-toggleable tests, declared in the order they are described and exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalTest {
    Cl,
    Co,
    Mo,
    Salts,
    BulkDensity,
    Olsen,
    Nh3,
    No3,
    Ssc,
}

impl OptionalTest {
    pub const ALL: [OptionalTest; 9] = [
        OptionalTest::Cl,
        OptionalTest::Co,
        OptionalTest::Mo,
        OptionalTest::Salts,
        OptionalTest::BulkDensity,
        OptionalTest::Olsen,
        OptionalTest::Nh3,
        OptionalTest::No3,
        OptionalTest::Ssc,
    ];

    pub fn key(self) -> &'static str {
        match self {
            OptionalTest::Cl => "Cl",
            OptionalTest::Co => "Co",
            OptionalTest::Mo => "Mo",
            OptionalTest::Salts => "Salts",
            OptionalTest::BulkDensity => "BulkDensity",
            OptionalTest::Olsen => "Olsen",
            OptionalTest::Nh3 => "NH3",
            OptionalTest::No3 => "NO3",
            OptionalTest::Ssc => "SSC",
        }
    }

    /// Label used in test lines and labels
    pub fn label(self) -> &'static str {
        match self {
            OptionalTest::BulkDensity => "Bulk Density",
            other => other.key(),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKey {
    Standard(StandardTest),
    Optional(OptionalTest),
}

impl TestKey {
    /// Every test key, standard first
    pub fn all() -> impl Iterator<Item = TestKey> {
        StandardTest::ALL
            .into_iter()
            .map(TestKey::Standard)
            .chain(OptionalTest::ALL.into_iter().map(TestKey::Optional))
    }

    pub fn key(self) -> &'static str {
        match self {
            TestKey::Standard(test) => test.key(),
            TestKey::Optional(test) => test.key(),
        }
    }
}

/// Which tests a sample is submitted for. Standard tests are always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SampleTests", into = "SampleTests")]
pub struct TestSelection {
    optional: [bool; OptionalTest::ALL.len()],
}

impl TestSelection {
    pub fn is_enabled(&self, key: TestKey) -> bool {
        match key {
            TestKey::Standard(_) => true,
            TestKey::Optional(test) => self.optional[test.index()],
        }
    }

    pub fn is_optional_enabled(&self, test: OptionalTest) -> bool {
        self.optional[test.index()]
    }

    pub fn set_optional(&mut self, test: OptionalTest, enabled: bool) {
        self.optional[test.index()] = enabled;
    }

    #[must_use]
    pub fn with(mut self, test: OptionalTest) -> Self {
        self.set_optional(test, true);
        self
    }

    /// Enabled optional tests in their fixed order
    pub fn enabled_optional(&self) -> impl Iterator<Item = OptionalTest> + '_ {
        OptionalTest::ALL
            .into_iter()
            .filter(|test| self.is_optional_enabled(*test))
    }

    pub fn has_optional(&self) -> bool {
        self.optional.iter().any(|enabled| *enabled)
    }
}

/// Wire form of a test selection, one `test_*` flag per column
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTests {
    #[serde(default = "enabled")]
    pub test_b: bool,
    #[serde(default = "enabled")]
    pub test_ca: bool,
    #[serde(default = "enabled")]
    pub test_cu: bool,
    #[serde(default = "enabled")]
    pub test_fe: bool,
    #[serde(default = "enabled")]
    pub test_k: bool,
    #[serde(default = "enabled")]
    pub test_mg: bool,
    #[serde(default = "enabled")]
    pub test_mn: bool,
    #[serde(default = "enabled")]
    pub test_na: bool,
    #[serde(default = "enabled")]
    pub test_om: bool,
    #[serde(default = "enabled")]
    pub test_p2: bool,
    #[serde(default = "enabled")]
    pub test_ph1: bool,
    #[serde(default = "enabled")]
    pub test_s: bool,
    #[serde(default = "enabled")]
    pub test_zn: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_cl: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_co: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_mo: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_salts: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_bulk_den: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_olsen: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_nh3: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_no3: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_ssc: bool,
}

fn enabled() -> bool {
    true
}

impl From<TestSelection> for SampleTests {
    fn from(selection: TestSelection) -> Self {
        let on = |test| selection.is_optional_enabled(test);
        SampleTests {
            test_b: true,
            test_ca: true,
            test_cu: true,
            test_fe: true,
            test_k: true,
            test_mg: true,
            test_mn: true,
            test_na: true,
            test_om: true,
            test_p2: true,
            test_ph1: true,
            test_s: true,
            test_zn: true,
            test_cl: on(OptionalTest::Cl),
            test_co: on(OptionalTest::Co),
            test_mo: on(OptionalTest::Mo),
            test_salts: on(OptionalTest::Salts),
            test_bulk_den: on(OptionalTest::BulkDensity),
            test_olsen: on(OptionalTest::Olsen),
            test_nh3: on(OptionalTest::Nh3),
            test_no3: on(OptionalTest::No3),
            test_ssc: on(OptionalTest::Ssc),
        }
    }
}

impl From<SampleTests> for TestSelection {
    // Standard flags are ignored; those tests are always run
    fn from(tests: SampleTests) -> Self {
        let mut selection = TestSelection::default();
        for (test, enabled) in [
            (OptionalTest::Cl, tests.test_cl),
            (OptionalTest::Co, tests.test_co),
            (OptionalTest::Mo, tests.test_mo),
            (OptionalTest::Salts, tests.test_salts),
            (OptionalTest::BulkDensity, tests.test_bulk_den),
            (OptionalTest::Olsen, tests.test_olsen),
            (OptionalTest::Nh3, tests.test_nh3),
            (OptionalTest::No3, tests.test_no3),
            (OptionalTest::Ssc, tests.test_ssc),
        ] {
            selection.set_optional(test, enabled);
        }
        selection
    }
}

/// A sample being composed on the client. Numeric inputs hold the raw text
/// the user typed; they are parsed when the batch is validated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleDraft {
    pub field_id: Option<FieldId>,
    pub sample_name: String,
    pub zone: String,
    pub plot_id: String,
    pub crop: String,
    pub yield_goal: String,
    pub previous_crop: String,
    pub previous_crop_yield: String,
    pub lime_history: Vec<LimeEntry>,
    pub acres: String,
    pub latitude: String,
    pub longitude: String,
    pub elevation: String,
    pub collect_datetime: Option<NaiveDateTime>,
    pub special_notes: String,
    pub program_level: ProgramLevel,
    pub organic: bool,
    pub tests: TestSelection,
}

impl SampleDraft {
    pub fn add_lime_entry(&mut self, entry: LimeEntry) {
        self.lime_history.push(entry);
    }

    /// Removes exactly the entry at `index`, even when equal entries exist
    pub fn remove_lime_entry(&mut self, index: usize) -> PortalResult<LimeEntry> {
        if index >= self.lime_history.len() {
            return Err(PortalError::IndexOutOfRange {
                index,
                len: self.lime_history.len(),
            });
        }
        Ok(self.lime_history.remove(index))
    }

    pub fn set_test(&mut self, test: OptionalTest, enabled: bool) {
        self.tests.set_optional(test, enabled);
    }
}

/// A sample as stored, with names denormalised by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSample {
    pub id: SampleId,
    pub batch_id: String,
    pub sample_sequence: u32,
    pub bag_id: String,
    pub company_id: CompanyId,
    #[serde(default)]
    pub grower_id: Option<GrowerId>,
    #[serde(default)]
    pub farm_id: Option<FarmId>,
    #[serde(default)]
    pub field_id: Option<FieldId>,
    #[serde(default)]
    pub sample_name: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub plot_id: Option<String>,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub yield_goal: Option<Decimal>,
    #[serde(default)]
    pub previous_crop: Option<String>,
    #[serde(default)]
    pub previous_crop_yield: Option<Decimal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lime_history: Vec<LimeEntry>,
    #[serde(default)]
    pub acres: Option<Decimal>,
    #[serde(default)]
    pub latitude: Option<Decimal>,
    #[serde(default)]
    pub longitude: Option<Decimal>,
    #[serde(default)]
    pub elevation: Option<Decimal>,
    #[serde(default)]
    pub collect_datetime: Option<NaiveDateTime>,
    #[serde(default)]
    pub special_notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub program_level: ProgramLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organic: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quarantine: bool,
    #[serde(flatten)]
    pub tests: TestSelection,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub grower_name: Option<String>,
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub field_name: Option<String>,
}

/// Parses a decimal, accepting scientific notation; `None` for anything else
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
