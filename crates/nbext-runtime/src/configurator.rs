use anyhow::{Context, Result};
use nbext_config::{ConfigStore, SectionLoadWarning, SectionSet};
use nbext_registry::{
    hide_incompat_setting, load_extensions_delta, merge_extensions, EnableTransition,
    ExtensionDescriptor, ExtensionFilter, InvalidListEntry, MergeDiagnostic, MergedExtension, MergedExtensions,
    ParameterInput, ParameterSpec, RegistryError, ResolvedParameter, Tag,
};
use serde_json::Value;

use crate::{focus_from_query, ExtensionSource};

/// `common` key controlling whether incompatible extensions are hidden.
pub const HIDE_INCOMPAT_KEY: &str = "nbext_hide_incompat";
const COMMON_SECTION: &str = "common";

/// Owns the config sections and the merged extension view.
///
/// Every mutation takes `&mut self`, so a refresh can never interleave with
/// an in-flight write. After each write the merged view is rebuilt from the
/// updated section documents.
pub struct Configurator {
    store: Box<dyn ConfigStore>,
    source: Box<dyn ExtensionSource>,
    host_version: String,
    sections: SectionSet,
    declared: Vec<ExtensionDescriptor>,
    invalid: Vec<InvalidListEntry>,
    merged: MergedExtensions,
    load_warnings: Vec<SectionLoadWarning>,
}

impl Configurator {
    pub fn new(
        store: Box<dyn ConfigStore>,
        source: Box<dyn ExtensionSource>,
        host_version: impl Into<String>,
    ) -> Self {
        Self::with_sections(store, source, host_version, SectionSet::with_default_sections())
    }

    pub fn with_sections(
        store: Box<dyn ConfigStore>,
        source: Box<dyn ExtensionSource>,
        host_version: impl Into<String>,
        sections: SectionSet,
    ) -> Self {
        Self {
            store,
            source,
            host_version: host_version.into(),
            sections,
            declared: Vec::new(),
            invalid: Vec::new(),
            merged: MergedExtensions::default(),
            load_warnings: Vec::new(),
        }
    }

    pub fn host_version(&self) -> &str {
        &self.host_version
    }

    pub fn sections(&self) -> &SectionSet {
        &self.sections
    }

    /// Sections that failed to load during the last refresh.
    pub fn load_warnings(&self) -> &[SectionLoadWarning] {
        &self.load_warnings
    }

    pub fn diagnostics(&self) -> &[MergeDiagnostic] {
        &self.merged.diagnostics
    }

    pub fn extensions(&self) -> &[MergedExtension] {
        &self.merged.extensions
    }

    pub fn tags(&self) -> &[Tag] {
        &self.merged.tags
    }

    /// Reloads every section, then fetches the declared list and merges.
    #[tracing::instrument(
        name = "nbext_runtime.configurator.refresh",
        skip(self),
        fields(store = %self.store.describe(), source = %self.source.describe())
    )]
    pub async fn refresh(&mut self) -> Result<()> {
        self.load_warnings = self.sections.load_all(self.store.as_ref()).await;
        let listing = self.source.list().await.with_context(|| {
            format!(
                "failed to load nbextension list from {}",
                self.source.describe()
            )
        })?;
        self.declared = listing.descriptors;
        self.invalid = listing.invalid;
        self.remerge();
        tracing::debug!(
            extensions = self.merged.extensions.len(),
            warnings = self.load_warnings.len(),
            "configurator refreshed"
        );
        Ok(())
    }

    fn remerge(&mut self) {
        self.merged = merge_extensions(&self.declared, &self.sections, &self.host_version);
        self.merged
            .diagnostics
            .extend(self.invalid.iter().map(|entry| MergeDiagnostic::InvalidDescriptor {
                require: entry.require.clone(),
                error: entry.error.clone(),
            }));
    }

    pub fn find(&self, require: &str) -> Result<&MergedExtension> {
        self.merged
            .find(require)
            .ok_or_else(|| RegistryError::UnknownExtension(require.to_string()).into())
    }

    /// Stores the enable intent for `require`.
    ///
    /// The host version is validated first; an unparseable version aborts
    /// without writing anything.
    pub async fn set_enabled(&mut self, require: &str, enabled: bool) -> Result<()> {
        let section = self.find(require)?.section.clone();
        let transition = if enabled {
            EnableTransition::Enable
        } else {
            EnableTransition::Disable
        };
        let value = transition.store_value(&self.host_version)?;
        self.write_load_extension(&section, require, transition, value)
            .await
    }

    /// Drops an unconfigurable stub's `load_extensions` entry.
    pub async fn forget(&mut self, require: &str) -> Result<()> {
        let extension = self.find(require)?;
        if !extension.unconfigurable {
            return Err(RegistryError::NotForgettable(require.to_string()).into());
        }
        let section = extension.section.clone();
        let transition = EnableTransition::Forget;
        let value = transition.store_value(&self.host_version)?;
        self.write_load_extension(&section, require, transition, value)
            .await
    }

    async fn write_load_extension(
        &mut self,
        section_name: &str,
        require: &str,
        transition: EnableTransition,
        value: Option<bool>,
    ) -> Result<()> {
        let store = self.store.as_ref();
        let section = self.sections.require_mut(section_name)?;
        section
            .update_delta(store, load_extensions_delta(require, value))
            .await
            .with_context(|| {
                format!("failed to update load_extensions.{require} in section {section_name}")
            })?;
        tracing::info!(
            require,
            section = section_name,
            action = transition.as_str(),
            value = ?value,
            "updated nbextension enable state"
        );
        self.remerge();
        Ok(())
    }

    fn parameter_spec(&self, require: &str, parameter: &str) -> Result<(String, ParameterSpec)> {
        let extension = self.find(require)?;
        let spec = extension
            .parameters
            .iter()
            .find(|spec| spec.name.as_deref() == Some(parameter))
            .ok_or_else(|| RegistryError::UnknownParameter {
                require: require.to_string(),
                parameter: parameter.to_string(),
            })?;
        Ok((extension.section.clone(), spec.clone()))
    }

    /// Resolves every declared parameter; a malformed one yields an error in its slot.
    pub fn parameters(
        &self,
        require: &str,
    ) -> Result<Vec<Result<ResolvedParameter, RegistryError>>> {
        let extension = self.find(require)?;
        let section = self.sections.get(&extension.section);
        Ok(extension
            .parameters
            .iter()
            .enumerate()
            .map(|(index, spec)| ResolvedParameter::resolve(require, index, spec, section))
            .collect())
    }

    pub fn get_parameter(&self, require: &str, parameter: &str) -> Result<ResolvedParameter> {
        let (section, spec) = self.parameter_spec(require, parameter)?;
        let index = self
            .find(require)?
            .parameters
            .iter()
            .position(|candidate| candidate.name.as_deref() == Some(parameter))
            .unwrap_or_default();
        Ok(ResolvedParameter::resolve(
            require,
            index,
            &spec,
            self.sections.get(&section),
        )?)
    }

    /// Coerces `raw` with the parameter's input type and stores it at its dot-path.
    pub async fn set_parameter(&mut self, require: &str, parameter: &str, raw: &str) -> Result<Value> {
        let (section_name, spec) = self.parameter_spec(require, parameter)?;
        let value = ParameterInput::from_spec(&spec).parse_value(parameter, raw)?;
        let store = self.store.as_ref();
        let section = self.sections.require_mut(&section_name)?;
        section
            .update(store, parameter, value.clone())
            .await
            .with_context(|| format!("failed to update {parameter} in section {section_name}"))?;
        tracing::info!(require, parameter, section = %section_name, "updated nbextension parameter");
        self.remerge();
        Ok(value)
    }

    /// Removes every parameter of `require` from its section so defaults apply again.
    pub async fn reset_parameters(&mut self, require: &str) -> Result<Vec<String>> {
        let extension = self.find(require)?;
        let section_name = extension.section.clone();
        let names: Vec<String> = extension
            .parameters
            .iter()
            .filter_map(|spec| spec.name.clone())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(names);
        }
        let store = self.store.as_ref();
        let section = self.sections.require_mut(&section_name)?;
        section
            .delete_keys(store, &names)
            .await
            .with_context(|| format!("failed to reset parameters of {require}"))?;
        self.remerge();
        Ok(names)
    }

    pub fn hide_incompat(&self) -> bool {
        hide_incompat_setting(&self.sections)
    }

    pub async fn set_hide_incompat(&mut self, hide: bool) -> Result<()> {
        let store = self.store.as_ref();
        let section = self.sections.require_mut(COMMON_SECTION)?;
        section
            .update(store, HIDE_INCOMPAT_KEY, Value::Bool(hide))
            .await
            .context("failed to store nbext_hide_incompat")?;
        Ok(())
    }

    /// Extensions passing `filter` under the persisted hide-incompatible setting.
    pub fn visible(&self, filter: &ExtensionFilter) -> Vec<&MergedExtension> {
        filter.apply(&self.merged.extensions, self.hide_incompat())
    }

    pub fn focus_from_deep_link(&self, query_or_url: &str) -> Option<&MergedExtension> {
        focus_from_query(query_or_url, &self.visible(&ExtensionFilter::default()))
    }
}
