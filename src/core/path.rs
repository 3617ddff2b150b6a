/*!
 * Attribute Paths
 * Dotted-path lookup into JSON attribute maps
 *
 * A path such as `location.lat` first matches a literal key of that name and
 * otherwise walks nested objects segment by segment.
 */

use serde_json::{Map, Value};

/// Look up a value by dotted path
pub fn lookup<'a>(attributes: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = attributes.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let mut current = attributes.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Mutable lookup by dotted path
pub fn lookup_mut<'a>(attributes: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    if attributes.contains_key(path) {
        return attributes.get_mut(path);
    }

    let mut segments = path.split('.');
    let mut current = attributes.get_mut(segments.next()?)?;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Remove every value a dotted path can address
///
/// Both the literal key and the nested value go, so a second removal of the
/// same path finds nothing. Returns the value `lookup` would have seen.
pub fn remove(attributes: &mut Map<String, Value>, path: &str) -> Option<Value> {
    let literal = attributes.remove(path);
    let nested = remove_nested(attributes, path);
    literal.or(nested)
}

fn remove_nested(attributes: &mut Map<String, Value>, path: &str) -> Option<Value> {
    let (parent, leaf) = path.rsplit_once('.')?;
    let mut segments = parent.split('.');
    let mut current = attributes.get_mut(segments.next()?)?;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    current.as_object_mut()?.remove(leaf)
}
