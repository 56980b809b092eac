use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::state::automaton::Step;
use crate::state::chapter::MintGroupRules;
use crate::state::episode::Episode;
use crate::state::labels::{Hash, LifecycleEvent};
use crate::state::mint_record::Allowance;
use crate::state::whitelist::is_whitelisted;

/// Per-account cap for public mints in one chapter, accumulated across calls.
pub const MAX_MINTABLE: u64 = 3;

/// Whitelist allocation presented with a mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistClaim {
    pub limit: u64,
    /// Chapter id the allocation was issued for.
    pub group: Hash,
    pub proof: Vec<Hash>,
}

/// Outcome of a validated mint request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintQuote {
    pub allowance: Allowance,
    /// Group the minted tokens are accounted to.
    pub group: Hash,
    pub price: u64,
    /// Tokens actually minted; may be below the requested quantity when the
    /// chapter has less room left.
    pub quantity: u64,
    /// Lamports charged for `quantity` tokens.
    pub cost: u64,
}

/// Supply-driven lifecycle event produced by a mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityReached {
    pub event: LifecycleEvent,
    pub step: Option<Step>,
}

impl Episode {
    fn minting_chapter_price(&self) -> Result<u64> {
        let chapter = self.current_chapter()?;
        require!(chapter.config.mints(), EpisodeError::NoMintChapter);
        Ok(chapter.config.minting.price)
    }

    /// Price of a public or native mint in the current chapter.
    pub fn current_default_price(&self) -> Result<u64> {
        self.minting_chapter_price()
    }

    /// Rule admitting `group` into the current chapter, if any.
    pub fn group_rule(&self, group: &Hash) -> Option<MintGroupRules> {
        self.mint_group(self.current_chapter_id(), group)
            .map(|rule| rule.rules)
    }

    /// Price paid by members of `group` in the current chapter: the group's
    /// own chapter price under an enabled fixed-price rule, otherwise the
    /// current chapter price.
    pub fn current_group_price(&self, group: &Hash) -> Result<u64> {
        let default_price = self.minting_chapter_price()?;
        match self.group_rule(group) {
            Some(rules) if rules.enabled && rules.fixed_price => Ok(self
                .chapter(group)
                .ok_or(EpisodeError::ChapterNonExistent)?
                .config
                .minting
                .price),
            _ => Ok(default_price),
        }
    }

    pub fn offer_matches_group_price(&self, group: &Hash, quantity: u64, offer: u64) -> Result<bool> {
        let price = self.current_group_price(group)?;
        let expected = price
            .checked_mul(quantity)
            .ok_or(EpisodeError::ArithmeticOverflow)?;
        Ok(expected == offer)
    }

    /// Allowance and group a mint is counted under.
    ///
    /// A proof for the current chapter or for a group the chapter admits
    /// draws on its whitelist allocation. In an open chapter any other proof
    /// is ignored and the mint is public; elsewhere it stays a whitelist
    /// claim and is refused while quoting.
    pub fn mint_allowance<'a>(&'a self, claimed: Option<&'a Hash>) -> (Allowance, &'a Hash) {
        let current = self.current_chapter_id();
        let Some(group) = claimed else {
            return (Allowance::Public, current);
        };
        let admitted = group == current || self.group_rule(group).is_some_and(|r| r.enabled);
        let open = self
            .current_chapter()
            .is_ok_and(|chapter| chapter.config.minting.is_open);
        if !admitted && open {
            (Allowance::Public, current)
        } else {
            (Allowance::Whitelist, group)
        }
    }

    /// Validate a mint without touching state.
    ///
    /// Checks run in order: active minting chapter, eligibility, exact offer,
    /// per-account allocation (`already_minted` counts previous mints under
    /// the same record) and chapter capacity.
    pub fn quote_mint(
        &self,
        minter: &Pubkey,
        quantity: u64,
        offer: u64,
        claim: Option<&WhitelistClaim>,
        already_minted: u64,
    ) -> Result<MintQuote> {
        let current = *self.current_chapter_id();
        let chapter = self.current_chapter()?;
        require!(chapter.config.mints(), EpisodeError::NoMintChapter);
        require!(
            !self.reveal.is_fulfilled(),
            EpisodeError::AlreadyRevealed
        );

        if let Some(claim) = claim {
            require!(
                is_whitelisted(
                    &self.whitelist_root,
                    minter,
                    claim.limit,
                    &claim.group,
                    &claim.proof,
                ),
                EpisodeError::SenderNotWhitelisted
            );
        }
        let (allowance, group) = self.mint_allowance(claim.map(|c| &c.group));
        let cap = match (allowance, claim) {
            (Allowance::Whitelist, Some(claim)) => {
                if *group != current {
                    let enabled = self.group_rule(group).is_some_and(|r| r.enabled);
                    require!(enabled, EpisodeError::GroupNotAllowed);
                }
                claim.limit
            }
            _ => {
                require!(
                    chapter.config.minting.is_open,
                    EpisodeError::SenderNotWhitelisted
                );
                MAX_MINTABLE
            }
        };
        let group = *group;

        let price = self.current_group_price(&group)?;
        require!(quantity > 0, EpisodeError::QuantityNotAllowed);
        let expected = price
            .checked_mul(quantity)
            .ok_or(EpisodeError::ArithmeticOverflow)?;
        require!(offer == expected, EpisodeError::OfferUnmatched);

        let allocated = already_minted
            .checked_add(quantity)
            .ok_or(EpisodeError::ArithmeticOverflow)?;
        require!(allocated <= cap, EpisodeError::QuantityNotAllowed);

        let limit = chapter.config.minting.limit;
        require!(self.total_supply < limit, EpisodeError::ChapterMintedOut);
        let quantity = quantity.min(limit - self.total_supply);
        let cost = price
            .checked_mul(quantity)
            .ok_or(EpisodeError::ArithmeticOverflow)?;

        Ok(MintQuote {
            allowance,
            group,
            price,
            quantity,
            cost,
        })
    }

    /// Book a validated mint. Returns the capacity event when this mint
    /// filled the chapter: `EpisodeMinted` once max supply is reached,
    /// `ChapterMinted` otherwise.
    pub fn apply_mint(&mut self, quote: &MintQuote) -> Result<Option<CapacityReached>> {
        let total_supply = self
            .total_supply
            .checked_add(quote.quantity)
            .ok_or(EpisodeError::ArithmeticOverflow)?;
        let limit = self.current_chapter()?.config.minting.limit;
        require!(total_supply <= limit, EpisodeError::ChapterMintedOut);
        self.total_supply = total_supply;

        if total_supply < limit {
            return Ok(None);
        }
        let event = if total_supply == self.max_supply {
            LifecycleEvent::EpisodeMinted
        } else {
            LifecycleEvent::ChapterMinted
        };
        let step = self.fire(event)?;
        Ok(Some(CapacityReached { event, step }))
    }

    /// End a minting chapter early by firing `MintingSealed`.
    pub fn seal_minting(&mut self) -> Result<Option<Step>> {
        let chapter = self.current_chapter()?;
        require!(chapter.config.mints(), EpisodeError::NoMintChapter);
        require!(
            self.total_supply < chapter.config.minting.limit,
            EpisodeError::SealingNotAllowed
        );
        self.automaton
            .transition(&LifecycleEvent::MintingSealed.hash())
    }
}
