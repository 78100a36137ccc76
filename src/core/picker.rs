//! Two-level job picker: category first, then one of its job codes.

use crate::errors::{AppError, AppResult};
use crate::models::{JobCategory, JobSelection};

#[derive(Debug, Clone, PartialEq)]
pub enum PickerState {
    PickingCategory,
    PickingJobCode(JobCategory),
}

#[derive(Debug)]
pub struct JobPicker {
    categories: Vec<JobCategory>,
    state: PickerState,
}

impl JobPicker {
    /// Inactive categories and codes are not offered. A category whose
    /// codes are all inactive is dropped rather than becoming directly
    /// selectable.
    pub fn new(categories: Vec<JobCategory>) -> Self {
        let categories = categories
            .into_iter()
            .filter(|c| c.is_active)
            .filter_map(|mut c| {
                let had_codes = c.has_job_codes();
                c.job_codes.retain(|jc| jc.is_active);
                (!had_codes || c.has_job_codes()).then_some(c)
            })
            .collect();
        Self {
            categories,
            state: PickerState::PickingCategory,
        }
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn categories(&self) -> &[JobCategory] {
        &self.categories
    }

    /// A childless category is a complete selection; otherwise the picker
    /// moves on to its job codes and returns `None`.
    pub fn choose_category(&mut self, category_id: i64) -> AppResult<Option<JobSelection>> {
        if self.state != PickerState::PickingCategory {
            return Err(AppError::transition("choose a category", "picking a job code"));
        }
        let category = self
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| AppError::Validation(format!("Unknown job category {category_id}")))?;

        if category.has_job_codes() {
            self.state = PickerState::PickingJobCode(category);
            Ok(None)
        } else {
            Ok(Some(JobSelection::category(category)))
        }
    }

    pub fn choose_job_code(&mut self, job_code_id: i64) -> AppResult<JobSelection> {
        let PickerState::PickingJobCode(category) = &self.state else {
            return Err(AppError::transition("choose a job code", "picking a category"));
        };
        let code = category
            .job_code(job_code_id)
            .cloned()
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unknown job code {job_code_id} for '{}'",
                    category.name
                ))
            })?;

        let selection = JobSelection::with_code(category.clone(), code);
        self.state = PickerState::PickingCategory;
        Ok(selection)
    }

    pub fn back(&mut self) {
        self.state = PickerState::PickingCategory;
    }

    /// Resolve a selection in one go (CLI `--category` / `--code`).
    pub fn select(&mut self, category_id: i64, job_code_id: Option<i64>) -> AppResult<JobSelection> {
        self.back();
        match (self.choose_category(category_id)?, job_code_id) {
            (Some(sel), None) => Ok(sel),
            (Some(sel), Some(code)) => Err(AppError::Validation(format!(
                "'{}' has no job codes (got {code})",
                sel.category.name
            ))),
            (None, Some(code)) => self.choose_job_code(code),
            (None, None) => {
                let name = match &self.state {
                    PickerState::PickingJobCode(c) => c.name.clone(),
                    PickerState::PickingCategory => String::new(),
                };
                self.back();
                Err(AppError::Validation(format!("Select a job code for '{name}'")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobCode;

    fn categories() -> Vec<JobCategory> {
        vec![
            JobCategory {
                id: 1,
                name: "Kitchen".into(),
                alias: String::new(),
                is_active: true,
                job_codes: vec![],
            },
            JobCategory {
                id: 2,
                name: "WRP".into(),
                alias: String::new(),
                is_active: true,
                job_codes: vec![
                    JobCode {
                        id: 20,
                        name: "Maple St".into(),
                        alias: String::new(),
                        is_active: true,
                    },
                    JobCode {
                        id: 21,
                        name: "Closed site".into(),
                        alias: String::new(),
                        is_active: false,
                    },
                ],
            },
        ]
    }

    #[test]
    fn childless_category_selects_immediately() {
        let mut p = JobPicker::new(categories());
        let sel = p.choose_category(1).unwrap().unwrap();
        assert_eq!(sel.display_name(), "Kitchen");
        assert_eq!(p.state(), &PickerState::PickingCategory);
    }

    #[test]
    fn category_with_codes_needs_second_step() {
        let mut p = JobPicker::new(categories());
        assert!(p.choose_category(2).unwrap().is_none());
        assert!(matches!(p.state(), PickerState::PickingJobCode(c) if c.id == 2));

        let sel = p.choose_job_code(20).unwrap();
        assert_eq!(sel.display_name(), "WRP - Maple St");
        assert_eq!(p.state(), &PickerState::PickingCategory);
    }

    #[test]
    fn unknown_ids_do_not_transition() {
        let mut p = JobPicker::new(categories());
        assert!(p.choose_category(99).is_err());
        assert_eq!(p.state(), &PickerState::PickingCategory);

        p.choose_category(2).unwrap();
        assert!(p.choose_job_code(21).is_err());
        assert!(matches!(p.state(), PickerState::PickingJobCode(_)));

        p.back();
        assert_eq!(p.state(), &PickerState::PickingCategory);
    }

    #[test]
    fn category_with_only_inactive_codes_is_not_offered() {
        let mut cats = categories();
        cats[1].job_codes.retain(|jc| !jc.is_active);
        let mut p = JobPicker::new(cats);

        assert_eq!(p.categories().len(), 1);
        assert!(p.choose_category(2).is_err());
        assert_eq!(p.state(), &PickerState::PickingCategory);
    }

    #[test]
    fn select_in_one_go() {
        let mut p = JobPicker::new(categories());
        assert_eq!(p.select(2, Some(20)).unwrap().clock_ids(), (None, Some(20)));
        assert!(p.select(2, None).is_err());
        assert!(p.select(1, Some(20)).is_err());
        assert_eq!(p.state(), &PickerState::PickingCategory);
    }
}
