use serde::Serialize;

use super::domain::{AgentDetails, PostalAddress, UserProfile, UserRole};

/// Scored part of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSection {
    Name,
    Email,
    EmailVerified,
    Phone,
    PhoneVerified,
    Avatar,
    Bio,
    DateOfBirth,
    Address,
    License,
    Agency,
    Experience,
    Specializations,
    ServiceAreas,
}

impl ProfileSection {
    const BASE: [ProfileSection; 9] = [
        ProfileSection::Name,
        ProfileSection::Email,
        ProfileSection::EmailVerified,
        ProfileSection::Phone,
        ProfileSection::PhoneVerified,
        ProfileSection::Avatar,
        ProfileSection::Bio,
        ProfileSection::DateOfBirth,
        ProfileSection::Address,
    ];

    const AGENT: [ProfileSection; 5] = [
        ProfileSection::License,
        ProfileSection::Agency,
        ProfileSection::Experience,
        ProfileSection::Specializations,
        ProfileSection::ServiceAreas,
    ];

    pub fn weight(self) -> u32 {
        match self {
            ProfileSection::Name | ProfileSection::Email => 15,
            ProfileSection::Address => 20,
            ProfileSection::License => 15,
            ProfileSection::EmailVerified
            | ProfileSection::Phone
            | ProfileSection::Avatar
            | ProfileSection::Bio
            | ProfileSection::Agency
            | ProfileSection::Specializations
            | ProfileSection::ServiceAreas => 10,
            ProfileSection::PhoneVerified
            | ProfileSection::DateOfBirth
            | ProfileSection::Experience => 5,
        }
    }

    /// Sections a profile with the given role is scored on.
    pub fn for_role(role: UserRole) -> Vec<ProfileSection> {
        let mut sections = Self::BASE.to_vec();
        if role == UserRole::Agent {
            sections.extend(Self::AGENT);
        }
        sections
    }

    fn is_complete(self, profile: &UserProfile) -> bool {
        let agent = profile.agent.as_ref();
        match self {
            ProfileSection::Name => filled(&profile.first_name) && filled(&profile.last_name),
            ProfileSection::Email => filled(&profile.email),
            ProfileSection::EmailVerified => profile.email_verified,
            ProfileSection::Phone => filled(&profile.phone),
            ProfileSection::PhoneVerified => profile.phone_verified,
            ProfileSection::Avatar => filled(&profile.avatar_url),
            ProfileSection::Bio => filled(&profile.bio),
            ProfileSection::DateOfBirth => profile.date_of_birth.is_some(),
            ProfileSection::Address => profile.address.as_ref().is_some_and(address_complete),
            ProfileSection::License => agent.is_some_and(|a| filled(&a.license_number)),
            ProfileSection::Agency => agent.is_some_and(|a| filled(&a.agency)),
            ProfileSection::Experience => agent.is_some_and(|a| a.experience_years.is_some()),
            ProfileSection::Specializations => agent.is_some_and(has_specializations),
            ProfileSection::ServiceAreas => {
                agent.is_some_and(|a| a.service_areas.iter().any(|area| !area.trim().is_empty()))
            }
        }
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

fn address_complete(address: &PostalAddress) -> bool {
    filled(&address.street) && filled(&address.city) && filled(&address.country)
}

fn has_specializations(agent: &AgentDetails) -> bool {
    agent.specializations.iter().any(|item| !item.trim().is_empty())
}

/// Weighted completion summary for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileCompletion {
    pub percentage: u8,
    pub completed: Vec<ProfileSection>,
    pub missing: Vec<ProfileSection>,
}

impl ProfileCompletion {
    pub fn evaluate(profile: &UserProfile) -> Self {
        let mut completed = Vec::new();
        let mut missing = Vec::new();
        let mut earned = 0;
        let mut total = 0;

        for section in ProfileSection::for_role(profile.role) {
            total += section.weight();
            if section.is_complete(profile) {
                earned += section.weight();
                completed.push(section);
            } else {
                missing.push(section);
            }
        }

        let percentage = if total == 0 { 0 } else { earned * 100 / total };
        Self {
            percentage: u8::try_from(percentage).unwrap_or(100),
            completed,
            missing,
        }
    }
}
