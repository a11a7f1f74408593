use std::fmt::Write as _;

use crate::animation::transition::Transition;
use crate::foundation::color::Color;
use crate::foundation::core::{Attrs, PrimitiveHandle};
use crate::foundation::error::{ApertureError, ApertureResult};
use crate::foundation::value::Value;
use crate::render::surface::{
    GEOMETRY_ATTR, GraphicsSurface, PendingCompletions, PrimitiveKind, merge_attrs,
};

#[derive(Clone, Debug)]
struct Retained {
    handle: PrimitiveHandle,
    kind: PrimitiveKind,
    attrs: Attrs,
}

/// Retained-mode surface that can serialize its scene as SVG.
///
/// Primitives paint in creation order. Transitions jump straight to their final state.
#[derive(Debug, Default)]
pub struct RetainedSurface {
    primitives: Vec<Retained>,
    next_handle: u64,
    completions: PendingCompletions,
}

impl RetainedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn complete_transitions(&mut self) -> usize {
        self.completions.fire()
    }

    fn position(&self, handle: PrimitiveHandle) -> ApertureResult<usize> {
        self.primitives
            .iter()
            .position(|p| p.handle == handle)
            .ok_or_else(|| ApertureError::surface(format!("unknown primitive {}", handle.0)))
    }

    pub fn to_svg(&self, width: f64, height: f64) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        for p in &self.primitives {
            out.push_str("  <path");
            if p.kind == PrimitiveKind::Line && !p.attrs.contains_key("fill") {
                out.push_str(r#" fill="none""#);
            }
            for (name, value) in &p.attrs {
                let Some((svg_name, svg_value)) = svg_attribute(name, value) else {
                    continue;
                };
                let _ = write!(out, r#" {svg_name}="{}""#, escape_xml(&svg_value));
            }
            out.push_str("/>\n");
        }
        out.push_str("</svg>\n");
        out
    }
}

fn svg_attribute<'a>(name: &'a str, value: &Value) -> Option<(&'a str, String)> {
    if value.is_nullish() {
        return None;
    }
    if name == "line-style" {
        let dash = match value.as_str()? {
            "dashed" => "6 4",
            "dotted" => "2 3",
            _ => return None,
        };
        return Some(("stroke-dasharray", dash.to_owned()));
    }
    if name == GEOMETRY_ATTR {
        return Some((name, value.to_string()));
    }
    let text = match value {
        Value::Text(s) => Color::parse(s).map_or_else(|| s.clone(), |c| c.to_css()),
        other => other.to_string(),
    };
    Some((name, text))
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl GraphicsSurface for RetainedSurface {
    fn create_primitive(
        &mut self,
        kind: PrimitiveKind,
        attrs: &Attrs,
    ) -> ApertureResult<PrimitiveHandle> {
        let handle = PrimitiveHandle(self.next_handle);
        self.next_handle += 1;
        let mut live = Attrs::new();
        merge_attrs(&mut live, attrs);
        self.primitives.push(Retained {
            handle,
            kind,
            attrs: live,
        });
        Ok(handle)
    }

    fn set_attributes(
        &mut self,
        handle: PrimitiveHandle,
        attrs: &Attrs,
        transition: Option<&Transition>,
    ) -> ApertureResult<()> {
        let i = self.position(handle)?;
        merge_attrs(&mut self.primitives[i].attrs, attrs);
        if let Some(t) = transition {
            self.completions.push(t);
        }
        Ok(())
    }

    fn remove_primitive(&mut self, handle: PrimitiveHandle) -> ApertureResult<()> {
        let i = self.position(handle)?;
        self.primitives.remove(i);
        Ok(())
    }

    fn attach_data(
        &mut self,
        handle: PrimitiveHandle,
        _data: &serde_json::Value,
        _index_path: &[usize],
    ) -> ApertureResult<()> {
        self.position(handle).map(|_| ())
    }

    fn get_attribute(&self, handle: PrimitiveHandle, name: &str) -> Option<Value> {
        self.primitives
            .iter()
            .find(|p| p.handle == handle)?
            .attrs
            .get(name)
            .cloned()
    }

    fn apparate(&mut self, handle: PrimitiveHandle, transition: &Transition) -> ApertureResult<()> {
        self.position(handle)?;
        self.completions.push(transition);
        Ok(())
    }
}
