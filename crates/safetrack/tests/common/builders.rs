//! Builders for record drafts with valid defaults.

#![allow(dead_code)]

use safetrack::catalog::{
    ELIMINATION_STATUSES, KPB_NONE, RISK_LEVELS, VIOLATION_CATEGORIES, VIOLATION_TYPES,
};
use safetrack::{CheckDraft, InspectionDraft};

pub struct InspectionBuilder {
    draft: InspectionDraft,
}

impl InspectionBuilder {
    pub fn new() -> Self {
        Self {
            draft: InspectionDraft {
                inspection_date: "01.03.2024".to_string(),
                object: "Стан 2000".to_string(),
                section: "Сварочный участок".to_string(),
                organization: "ООО Монтаж".to_string(),
                violator_name: "Иванов И.И.".to_string(),
                violation_description: "Работа без страховочной привязи".to_string(),
                violation_type: VIOLATION_TYPES[0].to_string(),
                violation_category: VIOLATION_CATEGORIES[0].to_string(),
                risk_level: RISK_LEVELS[0].to_string(),
                inspector_name: "Петров П.П.".to_string(),
                elimination_date: "05.03.2024".to_string(),
                elimination_status: ELIMINATION_STATUSES[0].to_string(),
            },
        }
    }

    pub fn date(mut self, date: &str) -> Self {
        self.draft.inspection_date = date.to_string();
        self
    }

    pub fn organization(mut self, name: &str) -> Self {
        self.draft.organization = name.to_string();
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.draft.violation_description = text.to_string();
        self
    }

    pub fn build(self) -> InspectionDraft {
        self.draft
    }
}

pub struct CheckBuilder {
    draft: CheckDraft,
}

impl CheckBuilder {
    pub fn new() -> Self {
        Self {
            draft: CheckDraft {
                date: "01.03.2024".to_string(),
                sp_name: "КЦ-1".to_string(),
                responsible: "Мастер Иванов И.И.".to_string(),
                po_name: "ООО Монтаж".to_string(),
                object: "Участок-1".to_string(),
                works_count: 2,
                responsibility_zone: "КЦ-1".to_string(),
                start_time: "08:00".to_string(),
                end_time: "12:30".to_string(),
                personnel_count: 6,
                checks_count: 1,
                violations_count: 0,
                violation_type: VIOLATION_TYPES[3].to_string(),
                kpb_violation: KPB_NONE.to_string(),
                act_issued: false,
            },
        }
    }

    pub fn date(mut self, date: &str) -> Self {
        self.draft.date = date.to_string();
        self
    }

    pub fn organization(mut self, name: &str) -> Self {
        self.draft.po_name = name.to_string();
        self
    }

    pub fn violations(mut self, count: i64) -> Self {
        self.draft.violations_count = count;
        self
    }

    pub fn kpb(mut self, value: &str) -> Self {
        self.draft.kpb_violation = value.to_string();
        self
    }

    pub fn act_issued(mut self, issued: bool) -> Self {
        self.draft.act_issued = issued;
        self
    }

    pub fn build(self) -> CheckDraft {
        self.draft
    }
}
