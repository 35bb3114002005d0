use crate::error::{MapperError, Result};
use crate::resources::Strings;

/// An angle split into degrees, minutes and seconds, with its cardinal direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Dms {
    pub deg: u32,
    pub min: u32,
    pub sec: f64,
    pub card: String,
}

/// Split an angle given in degrees. Longitudes are wrapped into [-180, 180]; cardinal
/// directions come from the `cardinal-north`, `-east`, `-south`, `-west` strings.
pub fn to_dms(t: f64, is_latitude: bool, strings: &Strings) -> Result<Dms> {
    let (t, card) = if is_latitude {
        if !(-90.0..=90.0).contains(&t) {
            return Err(MapperError::invalid("to_dms", "latitude", t));
        }
        (t, if t > 0.0 { "cardinal-north" } else { "cardinal-south" })
    } else {
        if !(t > -360.0 && t < 360.0) {
            return Err(MapperError::invalid("to_dms", "longitude", t));
        }
        let t = if t > 180.0 {
            t - 360.0
        } else if t < -180.0 {
            t + 360.0
        } else {
            t
        };
        (t, if t > 0.0 { "cardinal-east" } else { "cardinal-west" })
    };
    let t = t.abs();
    let deg = t.trunc();
    let minutes = (t - deg) * 60.0;
    let min = minutes.trunc();
    Ok(Dms {
        deg: deg as u32,
        min: min as u32,
        sec: (minutes - min) * 60.0,
        card: strings.translate(card).to_string(),
    })
}
