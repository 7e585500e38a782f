// Role-gated report access.
//
// The policy is a plain value: callers hold it, pass it where needed and
// derive new policies with `with_grant` / `without_grant` instead of editing
// a shared table in place.
use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "Admin Super")]
    AdminSuper,
    #[serde(rename = "Admin Input Data")]
    AdminInput,
    #[serde(rename = "Manager")]
    Manager,
    #[serde(rename = "Supervisor (IDS)")]
    SupervisorIds,
    #[serde(rename = "Supervisor Direct Sales (D2C)")]
    SupervisorD2c,
    #[serde(rename = "Salesforce (IDS)")]
    SalesforceIds,
    #[serde(rename = "Direct Sales (D2C)")]
    DirectSalesD2c,
}

impl UserRole {
    pub const ALL: [UserRole; 7] = [
        UserRole::AdminSuper,
        UserRole::AdminInput,
        UserRole::Manager,
        UserRole::SupervisorIds,
        UserRole::SupervisorD2c,
        UserRole::SalesforceIds,
        UserRole::DirectSalesD2c,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UserRole::AdminSuper => "Admin Super",
            UserRole::AdminInput => "Admin Input Data",
            UserRole::Manager => "Manager",
            UserRole::SupervisorIds => "Supervisor (IDS)",
            UserRole::SupervisorD2c => "Supervisor Direct Sales (D2C)",
            UserRole::SalesforceIds => "Salesforce (IDS)",
            UserRole::DirectSalesD2c => "Direct Sales (D2C)",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Accepts the display label or a compact slug such as `supervisor-ids`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let slug: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        UserRole::ALL
            .into_iter()
            .find(|r| {
                let label: String = r.label().chars().filter(|c| c.is_ascii_alphanumeric()).collect();
                label.to_ascii_lowercase() == slug || format!("{:?}", r).to_ascii_lowercase() == slug
            })
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    StockVoucher,
    OmzetOutlet,
    SalesPlanVoucher,
    SellThruDigipos,
    PenjualanD2c,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::StockVoucher,
        ReportKind::OmzetOutlet,
        ReportKind::SalesPlanVoucher,
        ReportKind::SellThruDigipos,
        ReportKind::PenjualanD2c,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::StockVoucher => "Stock Voucher",
            ReportKind::OmzetOutlet => "Omzet Outlet",
            ReportKind::SalesPlanVoucher => "Sales Plan Voucher Fisik",
            ReportKind::SellThruDigipos => "Sell Thru Digipos",
            ReportKind::PenjualanD2c => "Penjualan D2C",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    grants: BTreeMap<ReportKind, BTreeSet<UserRole>>,
}

impl Default for AccessPolicy {
    /// Menu permissions of the sales portal: outlet reports (stock, omzet)
    /// for management and IDS supervisors, sales plan also for D2C
    /// supervisors, sell-thru and D2C sales also for D2C direct sales.
    fn default() -> Self {
        use UserRole::*;
        let management = [AdminSuper, Manager, SupervisorIds];
        let mut grants = BTreeMap::new();
        grants.insert(ReportKind::StockVoucher, management.into_iter().collect());
        grants.insert(ReportKind::OmzetOutlet, management.into_iter().collect());
        grants.insert(
            ReportKind::SalesPlanVoucher,
            management.into_iter().chain([SupervisorD2c]).collect(),
        );
        for kind in [ReportKind::SellThruDigipos, ReportKind::PenjualanD2c] {
            grants.insert(kind, management.into_iter().chain([DirectSalesD2c]).collect());
        }
        AccessPolicy { grants }
    }
}

impl AccessPolicy {
    pub fn empty() -> Self {
        AccessPolicy { grants: BTreeMap::new() }
    }

    pub fn allows(&self, role: UserRole, report: ReportKind) -> bool {
        self.grants.get(&report).is_some_and(|roles| roles.contains(&role))
    }

    pub fn check(&self, role: UserRole, report: ReportKind) -> Result<()> {
        if self.allows(role, report) {
            Ok(())
        } else {
            Err(ReportError::AccessDenied {
                role: role.to_string(),
                report: report.to_string(),
            })
        }
    }

    pub fn with_grant(&self, role: UserRole, report: ReportKind) -> AccessPolicy {
        let mut next = self.clone();
        next.grants.entry(report).or_default().insert(role);
        next
    }

    pub fn without_grant(&self, role: UserRole, report: ReportKind) -> AccessPolicy {
        let mut next = self.clone();
        if let Some(roles) = next.grants.get_mut(&report) {
            roles.remove(&role);
        }
        next
    }

    pub fn reports_for(&self, role: UserRole) -> Vec<ReportKind> {
        ReportKind::ALL
            .into_iter()
            .filter(|r| self.allows(role, *r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_portal_menu() {
        let p = AccessPolicy::default();
        assert!(p.allows(UserRole::Manager, ReportKind::OmzetOutlet));
        assert!(!p.allows(UserRole::SupervisorD2c, ReportKind::OmzetOutlet));
        assert!(p.allows(UserRole::SupervisorD2c, ReportKind::SalesPlanVoucher));
        assert!(p.allows(UserRole::DirectSalesD2c, ReportKind::SellThruDigipos));
        assert!(p.allows(UserRole::SupervisorIds, ReportKind::StockVoucher));
        assert!(!p.allows(UserRole::DirectSalesD2c, ReportKind::StockVoucher));
        assert_eq!(
            p.reports_for(UserRole::DirectSalesD2c),
            vec![ReportKind::SellThruDigipos, ReportKind::PenjualanD2c]
        );
        assert!(p.reports_for(UserRole::SalesforceIds).is_empty());
        assert_eq!(p.reports_for(UserRole::AdminSuper), ReportKind::ALL.to_vec());
    }

    #[test]
    fn grants_return_new_policies() {
        let base = AccessPolicy::default();
        let widened = base.with_grant(UserRole::SalesforceIds, ReportKind::OmzetOutlet);
        assert!(widened.allows(UserRole::SalesforceIds, ReportKind::OmzetOutlet));
        assert!(!base.allows(UserRole::SalesforceIds, ReportKind::OmzetOutlet));

        let narrowed = widened.without_grant(UserRole::Manager, ReportKind::OmzetOutlet);
        assert!(!narrowed.allows(UserRole::Manager, ReportKind::OmzetOutlet));
        assert!(widened.allows(UserRole::Manager, ReportKind::OmzetOutlet));
        assert!(matches!(
            narrowed.check(UserRole::Manager, ReportKind::OmzetOutlet),
            Err(ReportError::AccessDenied { .. })
        ));
        assert!(AccessPolicy::empty().reports_for(UserRole::AdminSuper).is_empty());
    }

    #[test]
    fn roles_parse_from_labels_and_slugs() {
        assert_eq!("Supervisor (IDS)".parse::<UserRole>().unwrap(), UserRole::SupervisorIds);
        assert_eq!("supervisor-ids".parse::<UserRole>().unwrap(), UserRole::SupervisorIds);
        assert_eq!("manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("intern".parse::<UserRole>().is_err());
    }
}
