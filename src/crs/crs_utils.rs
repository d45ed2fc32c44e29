use core::slice;
use libc::c_char;
use std::{
    ffi::{c_int, CString},
    ptr::null_mut,
    str::from_utf8,
};

use anyhow::anyhow;

pub type EpsgCode = u32;

/// Geographic lon/lat coordinates as delivered by OpenStreetMap.
pub const WGS84: EpsgCode = 4326;

/// Spherical web mercator, the fixed planar CRS used unless configured otherwise.
pub const WEB_MERCATOR: EpsgCode = 3857;

pub fn epsg_code_to_authority_string(code: EpsgCode) -> String {
    format!("EPSG:{}", code)
}

/// Query UTM zones which contain the lon/lat WGS84 coordinate.
///
/// # Arguments
/// * lon - longitude in degrees.
/// * lat - latitude in degrees.
/// * datum_name - the name of the geodetic datum to query for. Example: "WGS84", "NAD83". If not specified, zones
///     with all datums are returned.
///
/// # Returns
/// EPSG authority codes for the found UTM zones.
pub fn query_utm_crs_info(
    lon: f64,
    lat: f64,
    datum_name: Option<&str>,
) -> anyhow::Result<Vec<EpsgCode>> {
    let auth_name = CString::new("EPSG")?;
    let mut results = Vec::new();
    unsafe {
        let context = proj_sys::proj_context_create();
        let crs_types: [proj_sys::PJ_TYPE; 1] = [proj_sys::PJ_TYPE_PJ_TYPE_PROJECTED_CRS];
        let query_params = proj_sys::proj_get_crs_list_parameters_create();
        (*query_params).types = crs_types.as_ptr();
        (*query_params).typesCount = 1;

        (*query_params).bbox_valid = true as i32;
        (*query_params).west_lon_degree = lon;
        (*query_params).south_lat_degree = lat;
        (*query_params).east_lon_degree = lon;
        (*query_params).north_lat_degree = lat;

        let out_result_count: *mut c_int = null_mut();

        let mut crs_info_list = proj_sys::proj_get_crs_info_list_from_database(
            context,
            auth_name.as_ptr(),
            query_params,
            out_result_count,
        );
        // Keep the head of the list, proj_crs_info_list_destroy needs it.
        let crs_info_list_head = crs_info_list;

        proj_sys::proj_get_crs_list_parameters_destroy(query_params);
        proj_sys::proj_context_destroy(context);

        if crs_info_list.is_null() {
            return Err(anyhow!("Failed to query UTM zones."));
        }

        let mut scan = || -> anyhow::Result<()> {
            while !(*crs_info_list).is_null() {
                let crs_info = **crs_info_list;
                crs_info_list = crs_info_list.offset(1);

                let crs_name = c_char_ptr_as_str(crs_info.name)?;
                if !is_utm_zone_with_datum(crs_name, datum_name)? {
                    continue;
                }
                results.push(c_char_ptr_as_str(crs_info.code)?.parse()?);
            }
            Ok(())
        };
        let scanned = scan();
        proj_sys::proj_crs_info_list_destroy(crs_info_list_head);
        scanned?;
    }
    Ok(results)
}

/// Pick the WGS84 UTM zone covering a lon/lat coordinate.
pub fn wgs84_utm_zone_for_coord(coord: geo::Coord) -> anyhow::Result<EpsgCode> {
    let zones = query_utm_crs_info(coord.x, coord.y, Some("WGS84"))?;
    zones
        .first()
        .copied()
        .ok_or_else(|| anyhow!("No UTM zones found for ({}, {})", coord.x, coord.y))
}

/// UTM zone names start with the datum name, e.g. "WGS 84 / UTM zone 32N".
fn is_utm_zone_with_datum(crs_name: &str, datum_name: Option<&str>) -> anyhow::Result<bool> {
    if !crs_name.contains("UTM zone") {
        return Ok(false);
    }
    let Some(datum_name) = datum_name else {
        return Ok(true);
    };
    let crs_datum = crs_name
        .split('/')
        .next()
        .ok_or_else(|| anyhow!("CRS '{}' does not have a datum specifier", crs_name))?;
    Ok(crs_datum.replace(' ', "") == datum_name)
}

fn c_char_ptr_as_str(c_string: *const c_char) -> anyhow::Result<&'static str> {
    unsafe {
        let slice = slice::from_raw_parts(c_string as *const u8, libc::strlen(c_string));
        from_utf8(slice).map_err(|err| anyhow!("Could not decode string {}", err))
    }
}
