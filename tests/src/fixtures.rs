//! Shared models.

use mrepo_core::{props, ObjectRef, PortError, Value};
use mrepo_model::{Model, ModelBuilder, ModelResult};

/// A small satellite decomposition.
///
/// ```text
/// satellite ─parts→ power ─parts→ battery, panel
///           ─parts→ comms ─parts→ antenna
/// panel, battery ─satisfies→ R1      antenna ─satisfies→ R2
/// power ⇄ comms (depends)            antenna ─depends→ battery
/// ```
///
/// Objects are created in the order of the fields below.
pub struct Satellite {
    pub model: Model,
    pub satellite: ObjectRef,
    pub power: ObjectRef,
    pub battery: ObjectRef,
    pub panel: ObjectRef,
    pub comms: ObjectRef,
    pub antenna: ObjectRef,
    pub r1: ObjectRef,
    pub r2: ObjectRef,
}

/// Build the satellite model.
pub fn satellite() -> Satellite {
    match build() {
        Ok(fixture) => fixture,
        Err(err) => panic!("satellite fixture failed to build: {}", err),
    }
}

fn build() -> ModelResult<Satellite> {
    let mut builder = ModelBuilder::new();

    builder
        .add_class("Element")
        .derived("label", |_, props| match props.get("name") {
            Some(Value::String(name)) => Value::String(format!("[{}]", name)),
            _ => Value::Null,
        })
        .done()?;
    builder
        .add_class("Part")
        .extends("Element")
        .operation("describe", &[], |_, props, _| {
            Ok(Value::String(format!("part {}", name_of(props))))
        })
        .operation("massIn", &["unit"], |_, props, args| {
            let mass = props.get("mass").and_then(Value::as_real).unwrap_or(0.0);
            match args.get("unit").and_then(Value::as_str) {
                Some("kg") => Ok(Value::Real(mass)),
                Some("g") => Ok(Value::Real(mass * 1000.0)),
                other => Err(PortError::operation_failed(
                    "massIn",
                    format!("unsupported unit {:?}", other),
                )),
            }
        })
        .done()?;
    builder
        .add_class("Subsystem")
        .extends("Part")
        .operation("describe", &[], |_, props, _| {
            Ok(Value::String(format!("subsystem {}", name_of(props))))
        })
        .done()?;
    builder.add_class("Requirement").extends("Element").done()?;

    builder.add_association("parts")?;
    builder.add_association("satisfies")?;
    builder.add_association("depends")?;

    let satellite = builder.create_object("Subsystem", props! { "name" => "satellite", "mass" => 0.0 })?;
    let power = builder.create_object("Subsystem", props! { "name" => "power", "mass" => 12.5 })?;
    let battery = builder.create_object("Part", props! { "name" => "battery", "mass" => 8.0 })?;
    let panel = builder.create_object("Part", props! { "name" => "panel", "mass" => 4.5 })?;
    let comms = builder.create_object("Subsystem", props! { "name" => "comms", "mass" => 3.0 })?;
    let antenna = builder.create_object("Part", props! { "name" => "antenna", "mass" => 1.2 })?;
    let r1 = builder.create_object(
        "Requirement",
        props! { "name" => "R1", "priority" => 1, "text" => "Provide 100W" },
    )?;
    let r2 = builder.create_object(
        "Requirement",
        props! { "name" => "R2", "priority" => 2, "text" => "Downlink at 2Mbps" },
    )?;

    builder.link("parts", satellite.id, power.id)?;
    builder.link("parts", satellite.id, comms.id)?;
    builder.link("parts", power.id, battery.id)?;
    builder.link("parts", power.id, panel.id)?;
    builder.link("parts", comms.id, antenna.id)?;
    builder.link("satisfies", panel.id, r1.id)?;
    builder.link("satisfies", battery.id, r1.id)?;
    builder.link("satisfies", antenna.id, r2.id)?;
    builder.link("depends", comms.id, power.id)?;
    builder.link("depends", power.id, comms.id)?;
    builder.link("depends", antenna.id, battery.id)?;

    Ok(Satellite {
        model: builder.build(),
        satellite,
        power,
        battery,
        panel,
        comms,
        antenna,
        r1,
        r2,
    })
}

fn name_of(props: &mrepo_core::Properties) -> String {
    props
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
