//! Category registry
//!
//! At most one category carries the default flag. Both [`CategoryRegistry::upsert`]
//! with `is_default` set and [`CategoryRegistry::set_default`] clear the flag
//! on every other category in the same locked write. Once a default exists it
//! only moves to another category; re-saving it never drops the flag.

use crate::core::Category;
use crate::error::{DeskError, Result};
use crate::storage::CategoryRepository;

#[derive(Debug, Clone)]
pub struct CategoryRegistry<S> {
    repository: S,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl<S: CategoryRepository> CategoryRegistry<S> {
    pub const fn new(repository: S) -> Self {
        Self { repository }
    }

    /// Look a category up by name, ignoring case
    pub fn get(&self, name: &str) -> Result<Category> {
        self.repository
            .categories()?
            .into_iter()
            .find(|c| same_name(&c.name, name))
            .ok_or_else(|| DeskError::CategoryNotFound {
                name: name.to_string(),
            })
    }

    /// All categories sorted by name, optionally only active ones
    pub fn list(&self, active_only: bool) -> Result<Vec<Category>> {
        let mut categories: Vec<_> = self
            .repository
            .categories()?
            .into_iter()
            .filter(|c| !active_only || c.is_active)
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    /// The current default category, if one is set
    pub fn default_category(&self) -> Result<Option<Category>> {
        Ok(self
            .repository
            .categories()?
            .into_iter()
            .find(|c| c.is_default))
    }

    /// Insert a new category or replace the one with the same name
    ///
    /// Replacing the current default keeps it the default; only
    /// [`CategoryRegistry::set_default`] or another default upsert moves the flag.
    pub fn upsert(&self, category: Category) -> Result<Category> {
        let mut category = normalize(category)?;

        let category = self.repository.modify_categories(move |categories| {
            let position = categories
                .iter()
                .position(|c| same_name(&c.name, &category.name));
            if let Some(index) = position {
                if categories[index].is_default && !category.is_default {
                    if !category.is_active {
                        return Err(DeskError::validation(format!(
                            "'{}' is the default category; choose another default first",
                            categories[index].name
                        )));
                    }
                    category.is_default = true;
                }
            }
            if category.is_default {
                for other in categories.iter_mut() {
                    other.is_default = false;
                }
            }
            match position {
                Some(index) => categories[index] = category.clone(),
                None => categories.push(category.clone()),
            }
            Ok(category)
        })?;

        tracing::info!(category = %category.name, default = category.is_default, "category saved");
        Ok(category)
    }

    /// Make `name` the only default category
    pub fn set_default(&self, name: &str) -> Result<Category> {
        let chosen = self.repository.modify_categories(|categories| {
            let index = categories
                .iter()
                .position(|c| same_name(&c.name, name))
                .ok_or_else(|| DeskError::CategoryNotFound {
                    name: name.to_string(),
                })?;
            if !categories[index].is_active {
                return Err(DeskError::validation(format!(
                    "inactive category '{}' cannot be the default",
                    categories[index].name
                )));
            }
            for (i, category) in categories.iter_mut().enumerate() {
                category.is_default = i == index;
            }
            Ok(categories[index].clone())
        })?;

        tracing::info!(category = %chosen.name, "default category changed");
        Ok(chosen)
    }
}

fn normalize(mut category: Category) -> Result<Category> {
    category.name = category.name.trim().to_string();
    if category.name.is_empty() {
        return Err(DeskError::validation("category name must not be empty"));
    }
    if category.is_default && !category.is_active {
        return Err(DeskError::validation(
            "an inactive category cannot be the default",
        ));
    }

    let mut tags: Vec<String> = Vec::with_capacity(category.default_tags.len());
    for tag in category.default_tags.drain(..) {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    category.default_tags = tags;
    Ok(category)
}
