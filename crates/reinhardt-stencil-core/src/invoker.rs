//! Component invocation
//!
//! The invoker evaluates the arguments of an invocation, enforces the component's
//! argument contract and calls the component. Contract enforcement happens in
//! this order:
//!
//! 1. supplied names missing from the contract are rejected unless the component
//!    accepts undeclared arguments
//! 2. declared arguments that were not supplied take their default, or fail when
//!    required
//! 3. every value runs through the configured [`ArgumentProcessor`]; optional
//!    values equal to their default and `mixed` arguments are accepted as is

use std::sync::Arc;

use crate::component::{Arguments, Children, MIXED, ResolvedComponent};
use crate::config::ArgumentProcessing;
use crate::context::RenderingContext;
use crate::error::{ArgumentContractError, TemplateResult};
use crate::node::{DynamicArgument, Invocation};
use crate::processor::{ArgumentProcessor, processor_for};
use crate::suggest::suggest_similar;
use crate::value::{Value, ValueMap};

/// Calls components with contract-checked arguments
#[derive(Clone)]
pub struct Invoker {
	processor: Arc<dyn ArgumentProcessor>,
}

impl Default for Invoker {
	fn default() -> Self {
		Self::with_policy(ArgumentProcessing::default())
	}
}

impl Invoker {
	pub fn new(processor: Arc<dyn ArgumentProcessor>) -> Self {
		Self { processor }
	}

	pub fn with_policy(policy: ArgumentProcessing) -> Self {
		Self::new(processor_for(policy))
	}

	pub fn processor(&self) -> &Arc<dyn ArgumentProcessor> {
		&self.processor
	}

	/// Evaluate the arguments of a parsed invocation and call its component
	pub fn invoke(
		&self,
		invocation: &Invocation,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let mut supplied = ValueMap::with_capacity(invocation.arguments.len());
		for dynamic in &invocation.dynamic_arguments {
			match dynamic {
				DynamicArgument::Named { name, value } => {
					let name = name.evaluate(context)?.to_output_string();
					let value = value.evaluate(context)?;
					supplied.insert(name, value);
				}
				DynamicArgument::Spread(node) => {
					spread_into(&mut supplied, node.evaluate(context)?);
				}
			}
		}
		for (name, node) in &invocation.arguments {
			let value = node.evaluate(context)?;
			supplied.insert(name.clone(), value);
		}

		self.call(
			&invocation.component,
			supplied,
			Children::Nodes(&invocation.children),
			context,
		)
	}

	/// Enforce the argument contract on already evaluated values and call the component
	pub fn call(
		&self,
		component: &ResolvedComponent,
		supplied: ValueMap,
		children: Children<'_>,
		context: &mut RenderingContext,
	) -> TemplateResult<Value> {
		let arguments = self.bind(component, supplied)?;
		tracing::trace!(
			component = component.type_name(),
			arguments = arguments.declared().len() + arguments.undeclared().len(),
			"invoking component"
		);
		component
			.component()
			.render(&arguments, &children, context)
	}

	fn bind(
		&self,
		component: &ResolvedComponent,
		supplied: ValueMap,
	) -> Result<Arguments, ArgumentContractError> {
		let contract = component.contract();
		let accepts_undeclared = component.component().accepts_undeclared_arguments();

		let mut declared = ValueMap::with_capacity(supplied.len());
		let mut undeclared = ValueMap::new();
		for (name, value) in supplied {
			if contract.contains(&name) {
				declared.insert(name, value);
			} else if accepts_undeclared {
				undeclared.insert(name, value);
			} else {
				return Err(ArgumentContractError::UnknownArgument {
					component: component.type_name().to_string(),
					suggestion: suggest_similar(&name, &contract.names()),
					argument: name,
				});
			}
		}

		let mut bound = ValueMap::with_capacity(contract.len());
		for definition in contract.iter() {
			let value = match declared.shift_remove(definition.name()) {
				Some(value) => value,
				None if definition.is_required() => {
					return Err(ArgumentContractError::MissingRequired {
						component: component.type_name().to_string(),
						argument: definition.name().to_string(),
					});
				}
				None => definition.default_value().clone(),
			};

			let unchecked = definition.type_name() == MIXED
				|| (!definition.is_required() && value == *definition.default_value());
			let value = if unchecked {
				value
			} else {
				let processed = self.processor.process(value, definition);
				if !self.processor.is_valid(&processed, definition) {
					return Err(ArgumentContractError::InvalidType {
						component: component.type_name().to_string(),
						argument: definition.name().to_string(),
						expected: definition.type_name().to_string(),
						actual: processed.type_name().to_string(),
					});
				}
				processed
			};
			bound.insert(definition.name().to_string(), value);
		}

		Ok(Arguments::new(bound, undeclared))
	}
}

impl std::fmt::Debug for Invoker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Invoker").finish_non_exhaustive()
	}
}

/// Merge the entries of a spread map into supplied arguments
pub(crate) fn spread_into(supplied: &mut ValueMap, value: Value) {
	if let Value::Map(entries) = value {
		for (name, value) in entries {
			supplied.insert(name, value);
		}
	}
}
