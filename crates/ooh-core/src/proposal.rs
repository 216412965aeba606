//! Proposal (cart) data model.
//!
//! Field names on the wire follow the proposal store's JSON
//! (`id_ooh`, `periodo_inicio`, `valor_locacao`, ...). Monetary fields hold
//! the catalog base values; commission and markups are applied by
//! [`crate::pricing`] at read time, never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pricing::CommissionTier;

/// Commercial period model of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Fixed 14-day blocks anchored to the grid epoch.
    #[serde(rename = "bissemanal", alias = "biweekly")]
    BiWeekly,
    /// Anchored day-of-month periods.
    #[serde(rename = "mensal", alias = "monthly")]
    Monthly,
}

impl PeriodType {
    /// Length of one billing cycle in days.
    pub fn cycle_days(&self) -> i64 {
        match self {
            PeriodType::BiWeekly => 14,
            PeriodType::Monthly => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::BiWeekly => "bissemanal",
            PeriodType::Monthly => "mensal",
        }
    }
}

impl std::str::FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bissemanal" | "biweekly" | "bi" => Ok(PeriodType::BiWeekly),
            "mensal" | "monthly" => Ok(PeriodType::Monthly),
            other => Err(format!("unknown period type: {other}")),
        }
    }
}

/// One placement inside a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalItem {
    /// Store-assigned id; absent until the item has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Placement ("ponto") reference.
    pub id_ooh: u64,
    #[serde(rename = "periodo_inicio", with = "date_format")]
    pub period_start: NaiveDate,
    #[serde(rename = "periodo_fim", with = "date_format")]
    pub period_end: NaiveDate,
    #[serde(rename = "periodo_comercializado")]
    pub period_type: PeriodType,
    #[serde(rename = "valor_locacao", default)]
    pub base_rental: f64,
    #[serde(rename = "valor_papel", default)]
    pub base_paper: f64,
    #[serde(rename = "valor_lona", default)]
    pub base_canvas: f64,
    /// Estimated daily audience.
    #[serde(rename = "fluxo_diario", default)]
    pub daily_flow: u64,
    /// Sub-periods toggled on in the period pickers.
    #[serde(rename = "selected_periods", default)]
    pub selected_period_ids: Vec<String>,
    #[serde(rename = "observacoes", default)]
    pub notes: String,
}

/// A named cart under one commission tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    #[serde(rename = "nome", alias = "name")]
    pub name: String,
    #[serde(rename = "comissao", alias = "commission_tier")]
    pub commission_tier: CommissionTier,
    #[serde(rename = "itens", alias = "items", default)]
    pub items: Vec<ProposalItem>,
}

impl Proposal {
    pub fn item(&self, item_id: u64) -> Option<&ProposalItem> {
        self.items.iter().find(|i| i.id == Some(item_id))
    }

    pub fn contains_placement(&self, id_ooh: u64) -> bool {
        self.items.iter().any(|i| i.id_ooh == id_ooh)
    }

    /// Parse a proposal document. One without `comissao` is priced under
    /// `default_tier`.
    pub fn from_json(json: &str, default_tier: CommissionTier) -> Result<Self, serde_json::Error> {
        let mut doc: serde_json::Value = serde_json::from_str(json)?;
        if let Some(fields) = doc.as_object_mut() {
            if !fields.contains_key("comissao") && !fields.contains_key("commission_tier") {
                fields.insert("comissao".into(), serde_json::Value::from(default_tier.as_str()));
            }
        }
        serde_json::from_value(doc)
    }
}

/// Partial edits staged for one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_type: Option<PeriodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rental: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_paper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_canvas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_flow: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_period_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItemPatch {
    /// Patch that sets the whole period at once.
    pub fn period(
        start: NaiveDate,
        end: NaiveDate,
        period_type: PeriodType,
        selected_period_ids: Vec<String>,
    ) -> Self {
        Self {
            period_start: Some(start),
            period_end: Some(end),
            period_type: Some(period_type),
            selected_period_ids: Some(selected_period_ids),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether this patch touches any period field.
    pub fn touches_period(&self) -> bool {
        self.period_start.is_some() || self.period_end.is_some() || self.period_type.is_some()
    }

    /// Layer `newer` on top of this patch; newer fields win.
    pub fn merge(&mut self, newer: ItemPatch) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if newer.$field.is_some() { self.$field = newer.$field; })*
            };
        }
        take!(
            period_start,
            period_end,
            period_type,
            base_rental,
            base_paper,
            base_canvas,
            daily_flow,
            selected_period_ids,
            notes
        );
    }

    /// Copy of `item` with this patch applied.
    pub fn apply_to(&self, item: &ProposalItem) -> ProposalItem {
        let mut out = item.clone();
        if let Some(v) = self.period_start {
            out.period_start = v;
        }
        if let Some(v) = self.period_end {
            out.period_end = v;
        }
        if let Some(v) = self.period_type {
            out.period_type = v;
        }
        if let Some(v) = self.base_rental {
            out.base_rental = v;
        }
        if let Some(v) = self.base_paper {
            out.base_paper = v;
        }
        if let Some(v) = self.base_canvas {
            out.base_canvas = v;
        }
        if let Some(v) = self.daily_flow {
            out.daily_flow = v;
        }
        if let Some(ref v) = self.selected_period_ids {
            out.selected_period_ids = v.clone();
        }
        if let Some(ref v) = self.notes {
            out.notes = v.clone();
        }
        out
    }

    /// Value staged for `field`, if any.
    pub fn get(&self, field: ItemField) -> Option<FieldValue> {
        match field {
            ItemField::PeriodStart => self.period_start.map(FieldValue::Date),
            ItemField::PeriodEnd => self.period_end.map(FieldValue::Date),
            ItemField::PeriodType => self.period_type.map(FieldValue::PeriodType),
            ItemField::BaseRental => self.base_rental.map(FieldValue::Money),
            ItemField::BasePaper => self.base_paper.map(FieldValue::Money),
            ItemField::BaseCanvas => self.base_canvas.map(FieldValue::Money),
            ItemField::DailyFlow => self.daily_flow.map(FieldValue::Count),
            ItemField::SelectedPeriodIds => {
                self.selected_period_ids.clone().map(FieldValue::Ids)
            }
            ItemField::Notes => self.notes.clone().map(FieldValue::Text),
        }
    }
}

/// Editable fields of a [`ProposalItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    PeriodStart,
    PeriodEnd,
    PeriodType,
    BaseRental,
    BasePaper,
    BaseCanvas,
    DailyFlow,
    SelectedPeriodIds,
    Notes,
}

/// A single field value read through the draft overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Date(NaiveDate),
    PeriodType(PeriodType),
    Money(f64),
    Count(u64),
    Ids(Vec<String>),
    Text(String),
}

impl ProposalItem {
    pub fn get(&self, field: ItemField) -> FieldValue {
        match field {
            ItemField::PeriodStart => FieldValue::Date(self.period_start),
            ItemField::PeriodEnd => FieldValue::Date(self.period_end),
            ItemField::PeriodType => FieldValue::PeriodType(self.period_type),
            ItemField::BaseRental => FieldValue::Money(self.base_rental),
            ItemField::BasePaper => FieldValue::Money(self.base_paper),
            ItemField::BaseCanvas => FieldValue::Money(self.base_canvas),
            ItemField::DailyFlow => FieldValue::Count(self.daily_flow),
            ItemField::SelectedPeriodIds => FieldValue::Ids(self.selected_period_ids.clone()),
            ItemField::Notes => FieldValue::Text(self.notes.clone()),
        }
    }
}

/// `YYYY-MM-DD` dates; the store sometimes appends a time part, which is dropped.
mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let day_part = raw.split('T').next().unwrap_or_default();
        NaiveDate::parse_from_str(day_part, FORMAT).map_err(serde::de::Error::custom)
    }
}
