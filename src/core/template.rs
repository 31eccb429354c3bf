use crate::errors::{AppError, AppResult};
use crate::models::template::ChecklistTemplate;
use crate::remote::RemoteStore;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// An import file holds either one template or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    Many(Vec<ChecklistTemplate>),
    One(Box<ChecklistTemplate>),
}

pub struct TemplateLogic;

impl TemplateLogic {
    /// Read templates from a `.json` file, or YAML for any other extension.
    pub fn parse_file(path: &Path) -> AppResult<Vec<ChecklistTemplate>> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let parsed: TemplateFile = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| AppError::InvalidTemplateFile(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::InvalidTemplateFile(format!("{}: {}", path.display(), e)))?
        };

        Ok(match parsed {
            TemplateFile::Many(list) => list,
            TemplateFile::One(one) => vec![*one],
        })
    }

    pub fn validate(template: &ChecklistTemplate) -> AppResult<()> {
        if template.id.trim().is_empty() {
            return Err(AppError::InvalidTemplateFile("template without id".into()));
        }
        if template.name.trim().is_empty() {
            return Err(AppError::InvalidTemplateFile(format!(
                "template '{}' has no name",
                template.id
            )));
        }
        if template.unlock_hour > 23 {
            return Err(AppError::InvalidUnlockHour(template.unlock_hour));
        }

        let mut seen = HashSet::new();
        for task in &template.tasks {
            if task.id.trim().is_empty() {
                return Err(AppError::InvalidTemplateFile(format!(
                    "template '{}' has a task without id",
                    template.id
                )));
            }
            if !seen.insert(task.id.as_str()) {
                return Err(AppError::InvalidTemplateFile(format!(
                    "template '{}' repeats task id '{}'",
                    template.id, task.id
                )));
            }
        }
        Ok(())
    }

    /// Parse, validate and store the templates of `path` for `store_id`.
    ///
    /// Templates without a store are assigned to `store_id`; templates of
    /// another store are rejected.
    pub async fn import(
        store: &dyn RemoteStore,
        store_id: &str,
        path: &Path,
    ) -> AppResult<Vec<ChecklistTemplate>> {
        let mut templates = Self::parse_file(path)?;
        if templates.is_empty() {
            return Err(AppError::InvalidTemplateFile(format!(
                "{}: no templates found",
                path.display()
            )));
        }

        for t in &mut templates {
            if t.store_id.is_empty() {
                t.store_id = store_id.to_string();
            } else if t.store_id != store_id {
                return Err(AppError::InvalidTemplateFile(format!(
                    "template '{}' belongs to store '{}', not '{}'",
                    t.id, t.store_id, store_id
                )));
            }
            Self::validate(t)?;
        }

        store.put_templates(&templates).await?;
        log::info!("imported {} template(s) for store {store_id}", templates.len());
        Ok(templates)
    }

    pub async fn list(store: &dyn RemoteStore, store_id: &str) -> AppResult<Vec<ChecklistTemplate>> {
        Ok(store.fetch_templates(store_id).await?)
    }
}
