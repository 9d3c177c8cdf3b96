use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::utils::constants::{ENTITY_CONTAINER, ENTITY_KEY, ENTITY_SET, ENTITY_TYPE, SCHEMA_NAMESPACE};

const EDMX_NS: &str = "http://docs.oasis-open.org/odata/ns/edmx";
const EDM_NS: &str = "http://docs.oasis-open.org/odata/ns/edm";

/// CSDL (OData V4) document for the entity set.
///
/// Only the key is declared. Cells carry strings, numbers or booleans per
/// row, so table columns travel as dynamic properties of the open type.
pub fn render_metadata() -> Result<String, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write_metadata_to(&mut writer)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

fn write_metadata_to<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut edmx = BytesStart::new("edmx:Edmx");
    edmx.push_attribute(("Version", "4.0"));
    edmx.push_attribute(("xmlns:edmx", EDMX_NS));
    writer.write_event(Event::Start(edmx))?;
    writer.write_event(Event::Start(BytesStart::new("edmx:DataServices")))?;

    let mut schema = BytesStart::new("Schema");
    schema.push_attribute(("Namespace", SCHEMA_NAMESPACE));
    schema.push_attribute(("xmlns", EDM_NS));
    writer.write_event(Event::Start(schema))?;

    write_entity_type(writer)?;
    write_entity_container(writer)?;

    writer.write_event(Event::End(BytesEnd::new("Schema")))?;
    writer.write_event(Event::End(BytesEnd::new("edmx:DataServices")))?;
    writer.write_event(Event::End(BytesEnd::new("edmx:Edmx")))?;
    Ok(())
}

fn write_entity_type<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
    let mut entity_type = BytesStart::new("EntityType");
    entity_type.push_attribute(("Name", ENTITY_TYPE));
    entity_type.push_attribute(("OpenType", "true"));
    writer.write_event(Event::Start(entity_type))?;

    writer.write_event(Event::Start(BytesStart::new("Key")))?;
    let mut key_ref = BytesStart::new("PropertyRef");
    key_ref.push_attribute(("Name", ENTITY_KEY));
    writer.write_event(Event::Empty(key_ref))?;
    writer.write_event(Event::End(BytesEnd::new("Key")))?;

    let mut key = BytesStart::new("Property");
    key.push_attribute(("Name", ENTITY_KEY));
    key.push_attribute(("Type", "Edm.String"));
    key.push_attribute(("Nullable", "false"));
    writer.write_event(Event::Empty(key))?;

    writer.write_event(Event::End(BytesEnd::new("EntityType")))?;
    Ok(())
}

fn write_entity_container<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
    let mut container = BytesStart::new("EntityContainer");
    container.push_attribute(("Name", ENTITY_CONTAINER));
    writer.write_event(Event::Start(container))?;

    let entity_type = format!("{SCHEMA_NAMESPACE}.{ENTITY_TYPE}");
    let mut entity_set = BytesStart::new("EntitySet");
    entity_set.push_attribute(("Name", ENTITY_SET));
    entity_set.push_attribute(("EntityType", entity_type.as_str()));
    writer.write_event(Event::Empty(entity_set))?;

    writer.write_event(Event::End(BytesEnd::new("EntityContainer")))?;
    Ok(())
}
