//! Reporter series table.
//!
//! Every supported reporter is one `ReporterSpec` entry. The extractor walks
//! the table once per input; nothing outside this module knows regex shapes.
//!
//! Family is the clustering unit: two citations from the same family are
//! never parallel to each other (a case lives in exactly one volume of a
//! series), while citations from different families may be parallel.

use briefcheck_protocol::{Jurisdiction, RegionalGroup};

/// Pattern priority when two matches overlap and tie on length.
/// Neutral > Official > Regional > Commercial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReporterClass {
    Commercial = 0,
    Regional = 1,
    Official = 2,
    Neutral = 3,
}

/// Reporter series group. `P.`, `P.2d` and `P.3d` are one family; a case is
/// printed in exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterFamily {
    UsReports,
    SupremeCourtReporter,
    LawyersEdition,
    FederalReporter,
    FederalSupplement,
    Pacific,
    NorthEastern,
    NorthWestern,
    SouthEastern,
    SouthWestern,
    Southern,
    Atlantic,
    Washington,
    California,
    NewYork,
    Illinois,
    NewMexico,
    Montana,
    Ohio,
    WestlawWeekly,
    Neutral,
}

/// Jurisdiction hint in const-friendly form; resolved lazily because
/// `Jurisdiction::State` owns its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Federal,
    State(&'static str),
    Regional(RegionalGroup),
    Unknown,
}

impl HintKind {
    pub fn resolve(&self) -> Jurisdiction {
        match self {
            HintKind::Federal => Jurisdiction::Federal,
            HintKind::State(name) => Jurisdiction::State((*name).to_string()),
            HintKind::Regional(group) => Jurisdiction::Regional(*group),
            HintKind::Unknown => Jurisdiction::Unknown,
        }
    }
}

/// One reporter series.
///
/// `regex` must define named groups `cite` (the span recorded on the
/// citation), `vol`, and `page`; `pin` is optional and sits outside `cite`.
pub struct ReporterSpec {
    pub tag: &'static str,
    pub family: ReporterFamily,
    pub class: ReporterClass,
    pub hint: HintKind,
    pub regex: &'static str,
    pub max_volume: u32,
}

macro_rules! cite_re {
    ($reporter:literal) => {
        concat!(
            r"\b(?P<cite>(?P<vol>\d{1,4})\s+",
            $reporter,
            r"\s+(?P<page>\d{1,5}))(?:,\s?(?P<pin>\d{1,5}))?"
        )
    };
}

macro_rules! neutral_re {
    ($code:literal) => {
        concat!(
            r"\b(?P<cite>(?P<vol>(?:19|20)\d{2})-",
            $code,
            r"-(?P<page>\d{1,5}))"
        )
    };
}

/// Supported reporter series (ordered roughly by specificity within each
/// family; overlap dedup handles the rest).
pub const REPORTERS: &[ReporterSpec] = &[
    // -- Federal ------------------------------------------------------------
    ReporterSpec {
        tag: "U.S.",
        family: ReporterFamily::UsReports,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"U\.\s?S\."),
        max_volume: 700,
    },
    ReporterSpec {
        tag: "S. Ct.",
        family: ReporterFamily::SupremeCourtReporter,
        class: ReporterClass::Commercial,
        hint: HintKind::Federal,
        regex: cite_re!(r"S\.\s?Ct\."),
        max_volume: 200,
    },
    ReporterSpec {
        tag: "L. Ed. 2d",
        family: ReporterFamily::LawyersEdition,
        class: ReporterClass::Commercial,
        hint: HintKind::Federal,
        regex: cite_re!(r"L\.\s?Ed\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "L. Ed.",
        family: ReporterFamily::LawyersEdition,
        class: ReporterClass::Commercial,
        hint: HintKind::Federal,
        regex: cite_re!(r"L\.\s?Ed\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F.4th",
        family: ReporterFamily::FederalReporter,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\.\s?4th"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F.3d",
        family: ReporterFamily::FederalReporter,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F.2d",
        family: ReporterFamily::FederalReporter,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F.",
        family: ReporterFamily::FederalReporter,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F. Supp. 3d",
        family: ReporterFamily::FederalSupplement,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\.\s?Supp\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F. Supp. 2d",
        family: ReporterFamily::FederalSupplement,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\.\s?Supp\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "F. Supp.",
        family: ReporterFamily::FederalSupplement,
        class: ReporterClass::Official,
        hint: HintKind::Federal,
        regex: cite_re!(r"F\.\s?Supp\."),
        max_volume: 2000,
    },
    // -- Regional -----------------------------------------------------------
    ReporterSpec {
        tag: "P.3d",
        family: ReporterFamily::Pacific,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Pacific),
        regex: cite_re!(r"P\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "P.2d",
        family: ReporterFamily::Pacific,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Pacific),
        regex: cite_re!(r"P\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "P.",
        family: ReporterFamily::Pacific,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Pacific),
        regex: cite_re!(r"P\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.E.3d",
        family: ReporterFamily::NorthEastern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::NorthEastern),
        regex: cite_re!(r"N\.\s?E\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.E.2d",
        family: ReporterFamily::NorthEastern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::NorthEastern),
        regex: cite_re!(r"N\.\s?E\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.E.",
        family: ReporterFamily::NorthEastern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::NorthEastern),
        regex: cite_re!(r"N\.\s?E\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.W.2d",
        family: ReporterFamily::NorthWestern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::NorthWestern),
        regex: cite_re!(r"N\.\s?W\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.W.",
        family: ReporterFamily::NorthWestern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::NorthWestern),
        regex: cite_re!(r"N\.\s?W\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "S.E.2d",
        family: ReporterFamily::SouthEastern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::SouthEastern),
        regex: cite_re!(r"S\.\s?E\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "S.E.",
        family: ReporterFamily::SouthEastern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::SouthEastern),
        regex: cite_re!(r"S\.\s?E\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "S.W.3d",
        family: ReporterFamily::SouthWestern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::SouthWestern),
        regex: cite_re!(r"S\.\s?W\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "S.W.2d",
        family: ReporterFamily::SouthWestern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::SouthWestern),
        regex: cite_re!(r"S\.\s?W\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "S.W.",
        family: ReporterFamily::SouthWestern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::SouthWestern),
        regex: cite_re!(r"S\.\s?W\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "So. 3d",
        family: ReporterFamily::Southern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Southern),
        regex: cite_re!(r"So\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "So. 2d",
        family: ReporterFamily::Southern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Southern),
        regex: cite_re!(r"So\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "So.",
        family: ReporterFamily::Southern,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Southern),
        regex: cite_re!(r"So\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "A.3d",
        family: ReporterFamily::Atlantic,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Atlantic),
        regex: cite_re!(r"A\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "A.2d",
        family: ReporterFamily::Atlantic,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Atlantic),
        regex: cite_re!(r"A\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "A.",
        family: ReporterFamily::Atlantic,
        class: ReporterClass::Regional,
        hint: HintKind::Regional(RegionalGroup::Atlantic),
        regex: cite_re!(r"A\."),
        max_volume: 2000,
    },
    // -- State official -----------------------------------------------------
    ReporterSpec {
        tag: "Wn. App. 2d",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wn\.\s?App\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Wn. App.",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wn\.\s?App\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Wn.2d",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wn\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Wn.",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wn\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Wash. App.",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wash\.\s?App\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Wash. 2d",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wash\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Wash.",
        family: ReporterFamily::Washington,
        class: ReporterClass::Official,
        hint: HintKind::State("washington"),
        regex: cite_re!(r"Wash\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Cal. 5th",
        family: ReporterFamily::California,
        class: ReporterClass::Official,
        hint: HintKind::State("california"),
        regex: cite_re!(r"Cal\.\s?5th"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Cal. 4th",
        family: ReporterFamily::California,
        class: ReporterClass::Official,
        hint: HintKind::State("california"),
        regex: cite_re!(r"Cal\.\s?4th"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Cal. 3d",
        family: ReporterFamily::California,
        class: ReporterClass::Official,
        hint: HintKind::State("california"),
        regex: cite_re!(r"Cal\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Cal. 2d",
        family: ReporterFamily::California,
        class: ReporterClass::Official,
        hint: HintKind::State("california"),
        regex: cite_re!(r"Cal\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Cal. App.",
        family: ReporterFamily::California,
        class: ReporterClass::Official,
        hint: HintKind::State("california"),
        regex: cite_re!(r"Cal\.\s?App\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Cal.",
        family: ReporterFamily::California,
        class: ReporterClass::Official,
        hint: HintKind::State("california"),
        regex: cite_re!(r"Cal\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.Y.3d",
        family: ReporterFamily::NewYork,
        class: ReporterClass::Official,
        hint: HintKind::State("new york"),
        regex: cite_re!(r"N\.\s?Y\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.Y.2d",
        family: ReporterFamily::NewYork,
        class: ReporterClass::Official,
        hint: HintKind::State("new york"),
        regex: cite_re!(r"N\.\s?Y\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.Y.",
        family: ReporterFamily::NewYork,
        class: ReporterClass::Official,
        hint: HintKind::State("new york"),
        regex: cite_re!(r"N\.\s?Y\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Ill. 2d",
        family: ReporterFamily::Illinois,
        class: ReporterClass::Official,
        hint: HintKind::State("illinois"),
        regex: cite_re!(r"Ill\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Ill.",
        family: ReporterFamily::Illinois,
        class: ReporterClass::Official,
        hint: HintKind::State("illinois"),
        regex: cite_re!(r"Ill\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "N.M.",
        family: ReporterFamily::NewMexico,
        class: ReporterClass::Official,
        hint: HintKind::State("new mexico"),
        regex: cite_re!(r"N\.\s?M\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Mont.",
        family: ReporterFamily::Montana,
        class: ReporterClass::Official,
        hint: HintKind::State("montana"),
        regex: cite_re!(r"Mont\."),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Ohio St. 3d",
        family: ReporterFamily::Ohio,
        class: ReporterClass::Official,
        hint: HintKind::State("ohio"),
        regex: cite_re!(r"Ohio\s?St\.\s?3d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Ohio St. 2d",
        family: ReporterFamily::Ohio,
        class: ReporterClass::Official,
        hint: HintKind::State("ohio"),
        regex: cite_re!(r"Ohio\s?St\.\s?2d"),
        max_volume: 2000,
    },
    ReporterSpec {
        tag: "Ohio St.",
        family: ReporterFamily::Ohio,
        class: ReporterClass::Official,
        hint: HintKind::State("ohio"),
        regex: cite_re!(r"Ohio\s?St\."),
        max_volume: 2000,
    },
    // -- Westlaw weekly -----------------------------------------------------
    ReporterSpec {
        tag: "WL",
        family: ReporterFamily::WestlawWeekly,
        class: ReporterClass::Commercial,
        hint: HintKind::Unknown,
        regex: r"\b(?P<cite>(?P<vol>(?:19|20)\d{2})\s+WL\s+(?P<page>\d{1,8}))",
        max_volume: 2100,
    },
    // -- Neutral ------------------------------------------------------------
    ReporterSpec {
        tag: "NMCA",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("new mexico"),
        regex: neutral_re!("NMCA"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "NMSC",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("new mexico"),
        regex: neutral_re!("NMSC"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "NM",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("new mexico"),
        regex: neutral_re!("NM"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "MT",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("montana"),
        regex: neutral_re!("MT"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "ND",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("north dakota"),
        regex: neutral_re!("ND"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "SD",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("south dakota"),
        regex: neutral_re!("SD"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "WI",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("wisconsin"),
        regex: neutral_re!("WI"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "VT",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("vermont"),
        regex: neutral_re!("VT"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "ME",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("maine"),
        regex: neutral_re!("ME"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "OK",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("oklahoma"),
        regex: neutral_re!("OK"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "UT",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("utah"),
        regex: neutral_re!("UT"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "WY",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("wyoming"),
        regex: neutral_re!("WY"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "Ohio",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("ohio"),
        regex: neutral_re!("Ohio"),
        max_volume: 2100,
    },
    ReporterSpec {
        tag: "Ark.",
        family: ReporterFamily::Neutral,
        class: ReporterClass::Neutral,
        hint: HintKind::State("arkansas"),
        regex: neutral_re!(r"Ark\."),
        max_volume: 2100,
    },
];

/// Family lookup for a canonical reporter tag, used by the clusterer.
pub fn family_of(tag: &str) -> Option<ReporterFamily> {
    REPORTERS
        .iter()
        .find(|spec| spec.tag == tag)
        .map(|spec| spec.family)
}

/// Jurisdiction hint for a canonical reporter tag.
pub fn jurisdiction_of(tag: &str) -> Jurisdiction {
    REPORTERS
        .iter()
        .find(|spec| spec.tag == tag)
        .map(|spec| spec.hint.resolve())
        .unwrap_or(Jurisdiction::Unknown)
}
