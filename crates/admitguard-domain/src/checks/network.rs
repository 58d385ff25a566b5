use super::utils::{
    bool_field, covers_all_ports, covers_port, describe_ports, id_of, is_allow, is_deny,
    is_open_cidr, list, section, str_field,
};
use crate::error::CheckError;
use crate::scan::CheckFinding;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

const FLOW_LOG_TRAFFIC_TYPES: &[&str] = &["ALL", "ACCEPT", "REJECT"];
const REQUIRED_VPC_TAGS: &[&str] = &["Project", "Environment"];
const PUBLIC_WEB_PORTS: &[u64] = &[80, 443];

pub fn flow_logs(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let logs = section(snapshot, "flow_logs")?;
    if logs.is_empty() {
        return Ok(CheckFinding::fail("no VPC flow logs configured")
            .with_details(json!({ "flow_logs": 0 })));
    }

    let mut problems = Vec::new();
    for log in logs {
        let id = id_of(log);
        match str_field(log, "status") {
            Some(s) if s.eq_ignore_ascii_case("ACTIVE") => {}
            Some(s) => problems.push(format!("{id}: status is {s}")),
            None => problems.push(format!("{id}: status missing")),
        }
        if str_field(log, "destination").is_none() {
            problems.push(format!("{id}: no log destination"));
        }
        let traffic = str_field(log, "traffic_type").unwrap_or("");
        if !FLOW_LOG_TRAFFIC_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(traffic))
        {
            problems.push(format!("{id}: unsupported traffic type `{traffic}`"));
        }
    }

    let details = json!({ "flow_logs": logs.len(), "problems": problems });
    if problems.is_empty() {
        Ok(CheckFinding::pass(format!("{} flow log(s) active", logs.len())).with_details(details))
    } else {
        Ok(CheckFinding::fail(format!("{} flow log problem(s)", problems.len())).with_details(details))
    }
}

pub fn acl_coverage(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let subnets = section(snapshot, "subnets")?;
    let acls = section(snapshot, "network_acls")?;
    let by_id: BTreeMap<String, &Value> = acls.iter().map(|acl| (id_of(acl), acl)).collect();

    let mut problems = Vec::new();
    for subnet in subnets {
        let id = id_of(subnet);
        match str_field(subnet, "network_acl_id") {
            None => problems.push(format!("{id}: no network ACL")),
            Some(acl_id) => match by_id.get(acl_id) {
                None => problems.push(format!("{id}: unknown network ACL {acl_id}")),
                Some(acl) if list(acl, "entries").is_empty() => {
                    problems.push(format!("{id}: network ACL {acl_id} has no entries"));
                }
                Some(_) => {}
            },
        }
    }

    if !problems.is_empty() {
        return Ok(CheckFinding::fail(format!(
            "{} subnet(s) lack network ACL coverage",
            problems.len()
        ))
        .with_details(json!({ "subnets": subnets.len(), "problems": problems })));
    }

    let mut public_web = Vec::new();
    for acl in acls {
        for entry in list(acl, "entries") {
            if is_allow(entry)
                && !bool_field(entry, "egress")
                && is_open_cidr(str_field(entry, "cidr"))
                && PUBLIC_WEB_PORTS.iter().any(|p| covers_port(entry, *p))
            {
                public_web.push(format!("{}: {}", id_of(acl), describe_ports(entry)));
            }
        }
    }

    if public_web.is_empty() {
        Ok(
            CheckFinding::pass(format!("{} subnet(s) covered by network ACLs", subnets.len()))
                .with_details(json!({ "subnets": subnets.len() })),
        )
    } else {
        Ok(
            CheckFinding::warn("network ACLs allow public web traffic from 0.0.0.0/0; review")
                .with_details(json!({ "subnets": subnets.len(), "public_web": public_web })),
        )
    }
}

pub fn segmentation(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let vpcs = section(snapshot, "vpcs")?;
    let subnets = section(snapshot, "subnets")?;
    if vpcs.is_empty() {
        return Ok(CheckFinding::fail("no VPCs in snapshot"));
    }

    let mut problems = Vec::new();
    for vpc in vpcs {
        let id = id_of(vpc);
        let tags = vpc.get("tags").unwrap_or(&Value::Null);
        for tag in REQUIRED_VPC_TAGS {
            if str_field(tags, tag).is_none() {
                problems.push(format!("{id}: missing tag {tag}"));
            }
        }

        let own: Vec<&Value> = subnets
            .iter()
            .filter(|s| str_field(s, "vpc_id") == Some(id.as_str()))
            .collect();
        let (public, private): (Vec<&Value>, Vec<&Value>) =
            own.into_iter().partition(|s| bool_field(s, "public"));
        if public.is_empty() {
            problems.push(format!("{id}: no public subnets"));
        }
        if private.is_empty() {
            problems.push(format!("{id}: no private subnets"));
        }
        let zones: BTreeSet<&str> = public
            .iter()
            .filter_map(|s| str_field(s, "availability_zone"))
            .collect();
        if !public.is_empty() && zones.len() < 2 {
            problems.push(format!("{id}: public subnets span a single availability zone"));
        }
    }

    let details = json!({ "vpcs": vpcs.len(), "problems": problems });
    if problems.is_empty() {
        Ok(CheckFinding::pass(format!("{} VPC(s) segmented", vpcs.len())).with_details(details))
    } else {
        Ok(CheckFinding::fail(format!("{} segmentation problem(s)", problems.len()))
            .with_details(details))
    }
}

pub fn security_groups(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let groups = section(snapshot, "security_groups")?;
    if groups.is_empty() {
        return Ok(CheckFinding::fail("no security groups defined"));
    }

    let empty: Vec<String> = groups
        .iter()
        .filter(|g| list(g, "ingress").is_empty() && list(g, "egress").is_empty())
        .map(id_of)
        .collect();
    if !empty.is_empty() {
        return Ok(
            CheckFinding::fail(format!("{} security group(s) have no rules", empty.len()))
                .with_details(json!({ "security_groups": groups.len(), "empty": empty })),
        );
    }

    let mut unrestricted = Vec::new();
    for group in groups {
        for rule in list(group, "ingress") {
            if is_open_cidr(str_field(rule, "cidr")) {
                unrestricted.push(format!("{}: {}", id_of(group), describe_ports(rule)));
            }
        }
    }

    if unrestricted.is_empty() {
        Ok(
            CheckFinding::pass(format!("{} security group(s) restricted", groups.len()))
                .with_details(json!({ "security_groups": groups.len() })),
        )
    } else {
        Ok(
            CheckFinding::warn(format!("{} unrestricted ingress rule(s)", unrestricted.len()))
                .with_details(
                    json!({ "security_groups": groups.len(), "unrestricted": unrestricted }),
                ),
        )
    }
}

pub fn private_subnet_exposure(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let subnets = section(snapshot, "subnets")?;
    let private: Vec<&Value> = subnets.iter().filter(|s| !bool_field(s, "public")).collect();
    if private.is_empty() {
        return Ok(CheckFinding::info("no private subnets in snapshot"));
    }

    let exposed: Vec<String> = private
        .iter()
        .filter(|s| bool_field(s, "map_public_ip_on_launch"))
        .map(|s| id_of(s))
        .collect();
    let details = json!({ "private_subnets": private.len(), "exposed": exposed });
    if exposed.is_empty() {
        Ok(CheckFinding::pass(format!(
            "{} private subnet(s) do not assign public IPs",
            private.len()
        ))
        .with_details(details))
    } else {
        Ok(CheckFinding::fail(format!(
            "{} private subnet(s) assign public IPs on launch",
            exposed.len()
        ))
        .with_details(details))
    }
}

pub fn nacl_default_deny(snapshot: &Value) -> Result<CheckFinding, CheckError> {
    let acls = section(snapshot, "network_acls")?;
    if acls.is_empty() {
        return Ok(CheckFinding::fail("no network ACLs defined"));
    }

    let mut problems = Vec::new();
    for acl in acls {
        let id = id_of(acl);
        let entries = list(acl, "entries");
        if entries.is_empty() {
            problems.push(format!("{id}: no entries"));
            continue;
        }
        for (egress, direction) in [(false, "ingress"), (true, "egress")] {
            let last = entries
                .iter()
                .filter(|e| bool_field(e, "egress") == egress)
                .max_by_key(|e| e.get("rule_number").and_then(Value::as_u64).unwrap_or(0));
            if let Some(last) = last
                && !(is_deny(last)
                    && is_open_cidr(str_field(last, "cidr"))
                    && covers_all_ports(last))
            {
                problems.push(format!("{id}: last {direction} entry is not deny-all"));
            }
        }
    }

    let details = json!({ "network_acls": acls.len(), "problems": problems });
    if problems.is_empty() {
        Ok(CheckFinding::pass(format!("{} network ACL(s) end in deny-all", acls.len()))
            .with_details(details))
    } else {
        Ok(CheckFinding::fail(format!("{} network ACL problem(s)", problems.len()))
            .with_details(details))
    }
}
