//! Mock CRM — an in-memory lead store with paging and lead creation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use flowdesk_core::traits::LeadSource;
use flowdesk_core::{Clock, Lead, LeadPage, LeadStatus, NewLead, Result};
use tokio::sync::RwLock;

const DEFAULT_SNAPSHOT_LIMIT: usize = 10;

/// (first, last, email, phone, status, created days ago, updated days ago)
type LeadSeed = (&'static str, &'static str, &'static str, &'static str, LeadStatus, i64, i64);

const SEED_LEADS: &[LeadSeed] = &[
    ("James", "Wilson", "james.wilson@techinnovate.com", "+1-202-555-0134", LeadStatus::New, 2, 1),
    ("Sarah", "Johnson", "sjohnson@globallogistics.net", "+1-310-555-8976", LeadStatus::Contacted, 5, 3),
    ("Michael", "Chen", "michael.chen@pacificfreight.com", "+1-415-555-3421", LeadStatus::Qualified, 10, 8),
    ("Emily", "Roberts", "eroberts@fastdistribution.co", "+1-512-555-7654", LeadStatus::New, 1, 1),
    ("David", "Nguyen", "dnguyen@expresscargo.org", "+1-213-555-9045", LeadStatus::Contacted, 7, 4),
    ("Patricia", "Garcia", "patricia.garcia@shipforward.com", "+1-619-555-2389", LeadStatus::Qualified, 15, 10),
    ("Robert", "Kim", "rkim@translogistics.net", "+1-253-555-6721", LeadStatus::Lost, 30, 25),
    ("Jennifer", "Taylor", "jennifer.taylor@swiftdeliver.co.uk", "+44-20-5551-8756", LeadStatus::New, 3, 2),
    ("Thomas", "Martinez", "tmartinez@cargolink.mx", "+52-55-5555-4321", LeadStatus::Contacted, 9, 6),
    ("Lisa", "Anderson", "lisa.anderson@freightforce.ca", "+1-604-555-1122", LeadStatus::New, 4, 3),
    ("Kevin", "Lee", "kevin.lee@asiaroutes.co.jp", "+81-3-5555-6543", LeadStatus::Contacted, 12, 9),
    ("Jessica", "Brown", "jbrown@logicon.com", "+1-312-555-8832", LeadStatus::Qualified, 20, 15),
];

fn seed_leads(now: DateTime<Utc>) -> Vec<Lead> {
    SEED_LEADS
        .iter()
        .enumerate()
        .map(|(i, &(first, last, email, phone, status, created, updated))| Lead {
            id: format!("lead-{}", i + 1),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            status,
            created_at: now - Duration::days(created),
            updated_at: now - Duration::days(updated),
        })
        .collect()
}

/// In-memory CRM. Newest leads are kept at the front.
pub struct MockCrm {
    leads: RwLock<Vec<Lead>>,
    snapshot_limit: usize,
    clock: Arc<dyn Clock>,
}

impl MockCrm {
    /// A CRM holding the twelve demo leads.
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        Self::with_leads(seed_leads(clock.now()), clock)
    }

    pub fn with_leads(leads: Vec<Lead>, clock: Arc<dyn Clock>) -> Self {
        Self {
            leads: RwLock::new(leads),
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            clock,
        }
    }

    /// How many leads one snapshot returns.
    pub fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit;
        self
    }

    /// One page of leads (1-based) plus the total count.
    pub async fn page(&self, limit: usize, page: usize) -> LeadPage {
        let leads = self.leads.read().await;
        LeadPage {
            leads: crate::paginate(leads.as_slice(), page, limit),
            total: leads.len(),
        }
    }

    /// Add a lead at the front. Missing fields stay empty; status defaults to new.
    pub async fn create_lead(&self, input: NewLead) -> Lead {
        let now = self.clock.now();
        let mut leads = self.leads.write().await;
        let lead = Lead {
            id: format!("lead-{}", leads.len() + 1),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            status: input.status.unwrap_or(LeadStatus::New),
            created_at: now,
            updated_at: now,
        };
        leads.insert(0, lead.clone());
        tracing::info!("📇 Lead created: {} ({})", lead.full_name(), lead.id);
        lead
    }

    pub async fn len(&self) -> usize {
        self.leads.read().await.len()
    }
}

#[async_trait]
impl LeadSource for MockCrm {
    fn name(&self) -> &str {
        "mock-crm"
    }

    async fn lead_snapshot(&self) -> Result<LeadPage> {
        Ok(self.page(self.snapshot_limit, 1).await)
    }
}
