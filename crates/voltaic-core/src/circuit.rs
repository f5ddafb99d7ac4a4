use voltaic_devices::component::Component;
use voltaic_devices::coupled_inductor::CoupledInductorGroup;

/// A symbolic component list, built up before preprocessing. Components and
/// groups are immutable in identity once added; a `Circuit` is the only
/// mutable collection in the run, and it is consumed by `preprocess`.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    elements: Vec<Component>,
    coupled_inductor_groups: Vec<CoupledInductorGroup>,
}

impl Circuit {
    pub fn new() -> Self {
        Circuit::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn add_component(&mut self, component: Component) -> &mut Self {
        self.elements.push(component);
        self
    }

    pub fn add_components(&mut self, components: impl IntoIterator<Item = Component>) -> &mut Self {
        self.elements.extend(components);
        self
    }

    pub fn add_coupled_inductor_group(&mut self, group: CoupledInductorGroup) -> &mut Self {
        self.coupled_inductor_groups.push(group);
        self
    }

    pub fn components(&self) -> &[Component] {
        &self.elements
    }

    pub fn components_mut(&mut self) -> &mut [Component] {
        &mut self.elements
    }

    pub fn coupled_inductor_groups(&self) -> &[CoupledInductorGroup] {
        &self.coupled_inductor_groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_devices::resistor::Resistor;

    #[test]
    fn starts_empty() {
        let circuit = Circuit::new();
        assert!(circuit.is_empty());
        assert!(circuit.components().is_empty());
    }

    #[test]
    fn add_component_appends_in_order() {
        let mut circuit = Circuit::new();
        circuit.add_component(Component::Resistor(Resistor::new("1", "a", "0", 100.0).unwrap()));
        circuit.add_component(Component::Resistor(Resistor::new("2", "a", "0", 200.0).unwrap()));
        assert_eq!(circuit.components().len(), 2);
        assert_eq!(circuit.components()[0].name(), "1");
        assert_eq!(circuit.components()[1].name(), "2");
    }
}
