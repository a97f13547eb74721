//! GPX exporter (A5): serialises a Route into a minimal GPX 1.1 document.
//! Outside the core; a thin collaborator invoked only by the HTTP surface.

use crate::model::Route;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const CREATOR: &str = "sailroute";

/// Renders `route` as a GPX 1.1 document: one `<trk>` with a `<name>` and a
/// single `<trkseg>` containing one `<trkpt>` per waypoint, in order.
pub fn to_gpx(route: &Route) -> String {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .expect("writing to an in-memory buffer cannot fail");

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", CREATOR));
    gpx.push_attribute(("xmlns", "http://www.topografix.com/GPX/1/1"));
    writer.write_event(Event::Start(gpx)).unwrap();

    writer.write_event(Event::Start(BytesStart::new("trk"))).unwrap();

    let name = route.name.clone().unwrap_or_else(|| route.id.to_string());
    writer.write_event(Event::Start(BytesStart::new("name"))).unwrap();
    writer
        .write_event(Event::Text(BytesText::new(&name)))
        .unwrap();
    writer.write_event(Event::End(BytesEnd::new("name"))).unwrap();

    writer.write_event(Event::Start(BytesStart::new("trkseg"))).unwrap();
    for point in &route.waypoints {
        let mut trkpt = BytesStart::new("trkpt");
        trkpt.push_attribute(("lat", point.lat.to_string().as_str()));
        trkpt.push_attribute(("lon", point.lon.to_string().as_str()));
        writer.write_event(Event::Empty(trkpt)).unwrap();
    }
    writer.write_event(Event::End(BytesEnd::new("trkseg"))).unwrap();

    writer.write_event(Event::End(BytesEnd::new("trk"))).unwrap();
    writer.write_event(Event::End(BytesEnd::new("gpx"))).unwrap();

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).expect("writer only emits UTF-8 text")
}
