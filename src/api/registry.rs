use crate::parsers::{self, ParserFn};
use crate::session::{HttpMethod, RequestSpec};
use crate::PfError;
use std::fmt;

/// What an endpoint's body contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    HtmlTable,
    Json,
    Text,
}

/// Static description of one endpoint: where to fetch it and how to read it
#[derive(Clone, Copy)]
pub struct EndpointDescriptor {
    pub id: &'static str,
    pub path: &'static str,
    pub method: HttpMethod,
    pub form: &'static [(&'static str, &'static str)],
    pub query: &'static [(&'static str, &'static str)],
    pub response_kind: ResponseKind,
    pub parser: ParserFn,
}

impl fmt::Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("response_kind", &self.response_kind)
            .finish_non_exhaustive()
    }
}

impl EndpointDescriptor {
    /// Builds the request for this endpoint
    pub fn request(&self) -> RequestSpec {
        let mut spec = match self.method {
            HttpMethod::Get => RequestSpec::get(self.path),
            HttpMethod::Post => RequestSpec::post(self.path),
        };
        for (key, value) in self.form {
            spec = spec.with_form(key, value);
        }
        for (key, value) in self.query {
            spec = spec.with_query(key, value);
        }
        spec
    }
}

/// Endpoints polled by `system_stats`
pub const HEALTH_ENDPOINTS: &[&str] = &["general", "software_system", "thermal", "disks"];

const ENDPOINTS: &[EndpointDescriptor] = &[
    EndpointDescriptor {
        id: "general",
        path: "getstats.php",
        method: HttpMethod::Post,
        form: &[("skipitems[0]", "")],
        query: &[],
        response_kind: ResponseKind::Text,
        parser: parsers::parse_general,
    },
    EndpointDescriptor {
        id: "software_system",
        path: "pkg_mgr_install.php",
        method: HttpMethod::Post,
        form: &[("getversion", "yes")],
        query: &[],
        response_kind: ResponseKind::Json,
        parser: parsers::parse_software_system,
    },
    EndpointDescriptor {
        id: "thermal",
        path: "widgets/widgets/thermal_sensors.widget.php",
        method: HttpMethod::Post,
        form: &[("getThermalSensorsData", "1")],
        query: &[],
        response_kind: ResponseKind::Text,
        parser: parsers::parse_thermal,
    },
    EndpointDescriptor {
        id: "disks",
        path: "widgets/widgets/disks.widget.php",
        method: HttpMethod::Post,
        form: &[("widgetkey", "disks-0")],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_disks,
    },
    EndpointDescriptor {
        id: "interface_stats",
        path: "widgets/widgets/interface_statistics.widget.php",
        method: HttpMethod::Post,
        form: &[("widgetkey", "interface_statistics-0")],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_interface_stats,
    },
    EndpointDescriptor {
        id: "openvpn_connections",
        path: "status_openvpn.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_openvpn,
    },
    EndpointDescriptor {
        id: "dhcp_leases",
        path: "status_dhcp_leases.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_dhcp_leases,
    },
    EndpointDescriptor {
        id: "gateways",
        path: "status_gateways.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_gateways,
    },
    EndpointDescriptor {
        id: "routes_v4",
        path: "diag_routes.php",
        method: HttpMethod::Post,
        form: &[("limit", "1000"), ("IPv4", "true"), ("filter", ""), ("isAjax", "1")],
        query: &[],
        response_kind: ResponseKind::Text,
        parser: parsers::parse_routes_v4,
    },
    EndpointDescriptor {
        id: "routes_v6",
        path: "diag_routes.php",
        method: HttpMethod::Post,
        form: &[("limit", "1000"), ("IPv6", "true"), ("filter", ""), ("isAjax", "1")],
        query: &[],
        response_kind: ResponseKind::Text,
        parser: parsers::parse_routes_v6,
    },
    EndpointDescriptor {
        id: "carp",
        path: "status_carp.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_carp,
    },
    EndpointDescriptor {
        id: "arp",
        path: "diag_arp.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_arp,
    },
    EndpointDescriptor {
        id: "ndp",
        path: "diag_ndp.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::HtmlTable,
        parser: parsers::parse_ndp,
    },
    EndpointDescriptor {
        id: "states",
        path: "diag_dump_states.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[],
        response_kind: ResponseKind::Text,
        parser: parsers::parse_states,
    },
    EndpointDescriptor {
        id: "haproxy",
        path: "haproxy/haproxy_stats.php",
        method: HttpMethod::Get,
        form: &[],
        query: &[("haproxystats", "1;json")],
        response_kind: ResponseKind::Json,
        parser: parsers::parse_haproxy,
    },
];

/// Looks up an endpoint by id
pub fn resolve(endpoint_id: &str) -> Result<&'static EndpointDescriptor, PfError> {
    ENDPOINTS
        .iter()
        .find(|e| e.id == endpoint_id)
        .ok_or_else(|| PfError::UnknownEndpoint(endpoint_id.to_string()))
}

/// All registered endpoints, in registry order
pub fn descriptors() -> &'static [EndpointDescriptor] {
    ENDPOINTS
}

/// Ids of all registered endpoints
pub fn supported_endpoints() -> Vec<&'static str> {
    ENDPOINTS.iter().map(|e| e.id).collect()
}
