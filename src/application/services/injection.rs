//! Property injection: declared builtin properties, then injectable members.

use tracing::{debug, trace, warn};

use crate::application::error::{ApplicationResult, BoxError, ConstructionError};
use crate::application::services::builder::ConstructionEngine;
use crate::application::types::ComponentType;
use crate::domain::{find_member, Builtin, Component, DomainError, MemberType, ServiceKey, Value};
use crate::infrastructure::traits::ParseRequest;

impl ConstructionEngine<'_> {
    /// Assign every declared property of `builtin` onto `target`.
    ///
    /// A property without a matching member only warns; the assignment is
    /// still attempted. Any other failure aborts the build.
    pub(crate) fn update_properties(
        &self,
        builtin: &Builtin,
        target: &dyn Component,
        ignored: &[&str],
    ) -> ApplicationResult<()> {
        let case_sensitive = self.ctx.settings().case_sensitive_members;

        for property in builtin.properties().iter() {
            if ignored.iter().any(|i| i.eq_ignore_ascii_case(property.name())) {
                continue;
            }

            let member = find_member(target, property.name(), case_sensitive);
            if member.is_none() {
                warn!(
                    "The '{}' property of '{}' builtin does not exist on '{}'",
                    property.name(),
                    builtin,
                    target.type_name()
                );
            }
            let name = member.map_or(property.name(), |m| m.name);

            let assigned = match member {
                Some(m) if !m.writable => Err(Box::new(DomainError::ReadOnlyMember {
                    member: m.name.to_string(),
                    type_name: target.type_name().to_string(),
                }) as BoxError),
                _ => self
                    .resolve_literal(builtin, property.raw(), name, member.map(|m| m.ty))
                    .and_then(|value| target.set_member(name, value).map_err(BoxError::from)),
            };

            match assigned {
                Ok(()) => trace!("set '{}' on '{}'", name, target.type_name()),
                Err(e) if member.is_none() && is_member_not_found(&e) => {
                    debug!("'{}' not assignable on '{}': {}", name, target.type_name(), e);
                }
                Err(source) => {
                    return Err(ConstructionError::Property {
                        builtin: builtin.to_string(),
                        property: property.name().to_string(),
                        raw: property.raw().to_string(),
                        target_type: target.type_name().to_string(),
                        source,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Fill the injectable members of `component_type` from service providers.
    ///
    /// Members already covered by a declared property are skipped.
    pub(crate) fn inject_services(
        &self,
        builtin: &Builtin,
        component_type: &ComponentType,
        target: &dyn Component,
    ) -> ApplicationResult<()> {
        let injectables: Vec<_> = component_type
            .injectables()
            .iter()
            .filter(|i| !builtin.properties().contains(i.member()))
            .collect();
        if injectables.is_empty() {
            return Ok(());
        }

        let reserve = self.find_service_provider(builtin)?;
        let providers = &self.ctx.container().providers;

        for injectable in injectables {
            let provider = injectable
                .provider_name()
                .and_then(|name| providers.get_provider(name))
                .unwrap_or_else(|| reserve.clone());

            let key = match (injectable.service_name(), injectable.service_contract()) {
                (Some(name), _) => ServiceKey::Name(name),
                (None, Some(contract)) => ServiceKey::Contract(contract),
                (None, None) => ServiceKey::Contract(injectable.member_type()),
            };

            let value = provider
                .resolve(key)
                .ok_or_else(|| ConstructionError::Injection {
                    member: injectable.member().to_string(),
                    target_type: component_type.name().to_string(),
                    key: key.to_string(),
                })?;
            trace!("inject '{}' from {}", injectable.member(), key);
            target.set_member(injectable.member(), value)?;
        }
        Ok(())
    }

    /// Resolve declarative text for a member: parser first, then primitive
    /// conversion when the member type is known.
    pub(crate) fn resolve_literal(
        &self,
        builtin: &Builtin,
        raw: &str,
        member_name: &str,
        member_type: Option<MemberType>,
    ) -> Result<Value, BoxError> {
        let parser = &self.ctx.container().parser;
        let value = if !raw.trim().is_empty() && parser.can_parse(raw) {
            let request = ParseRequest {
                node: builtin.node(),
                builtin: Some(builtin),
                member_name,
                member_type,
            };
            parser.parse(raw, &request)?
        } else {
            Value::Text(raw.to_string())
        };

        match member_type {
            Some(MemberType::Value(kind, shape)) => Ok(value.convert(kind, shape)?),
            _ => Ok(value),
        }
    }
}

fn is_member_not_found(error: &BoxError) -> bool {
    matches!(
        error.downcast_ref::<DomainError>(),
        Some(DomainError::MemberNotFound { .. })
    )
}
