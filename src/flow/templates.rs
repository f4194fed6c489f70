//! Static Cadence templates for the built-in Flow actions.
//!
//! Mainnet contract addresses are baked into the templates; arguments are
//! bound positionally when the transaction or script is submitted.

/// Purchase a TopShot moment from a marketplace listing.
/// Args: marketplaceAddress (Address), nftId (UInt64), price (UFix64).
pub const NFT_PURCHASE: &str = r#"
import NonFungibleToken from 0x1d7e57aa55817448
import TopShot from 0x0ea2b1c0df6d07531
import TopShotMarket from 0x4bcadc785a64c7c8
import FungibleToken from 0x7e60df042a9c0868
import FlowToken from 0x7e60df042a9c0868

transaction(marketplaceAddress: Address, nftId: UInt64, price: UFix64) {
    let paymentVault: &FlowToken.Vault{FungibleToken.Receiver}
    let topShotCollection: &TopShot.Collection{NonFungibleToken.CollectionPublic}
    let marketplace: &TopShotMarket.Marketplace

    prepare(acct: AuthAccount) {
        self.paymentVault = acct.getCapability(/public/flowTokenReceiver)
            .borrow<&FlowToken.Vault{FungibleToken.Receiver}>()
            ?? panic("Could not borrow payment vault")

        self.topShotCollection = acct.getCapability(/public/topshotCollection)
            .borrow<&TopShot.Collection{NonFungibleToken.CollectionPublic}>()
            ?? panic("Could not borrow TopShot collection")

        self.marketplace = getAccount(marketplaceAddress)
            .getCapability(/public/topshotMarket)
            .borrow<&TopShotMarket.Marketplace>()
            ?? panic("Could not borrow marketplace")
    }

    execute {
        self.marketplace.purchase(tokenID: nftId, price: price, recipient: self.topShotCollection)
    }
}
"#;

/// List a TopShot moment for sale.
/// Args: marketplaceAddress (Address), nftId (UInt64), price (UFix64).
pub const NFT_SALE: &str = r#"
import NonFungibleToken from 0x1d7e57aa55817448
import TopShot from 0x0ea2b1c0df6d07531
import TopShotMarket from 0x4bcadc785a64c7c8

transaction(marketplaceAddress: Address, nftId: UInt64, price: UFix64) {
    let topShotCollection: &TopShot.Collection{NonFungibleToken.Provider}
    let marketplace: &TopShotMarket.Marketplace

    prepare(acct: AuthAccount) {
        self.topShotCollection = acct.getCapability(/private/topshotCollection)
            .borrow<&TopShot.Collection{NonFungibleToken.Provider}>()
            ?? panic("Could not borrow TopShot collection")

        self.marketplace = getAccount(marketplaceAddress)
            .getCapability(/public/topshotMarket)
            .borrow<&TopShotMarket.Marketplace>()
            ?? panic("Could not borrow marketplace")
    }

    execute {
        self.marketplace.listForSale(tokenID: nftId, price: price)
    }
}
"#;

/// Read-only portfolio query returning the moments held by an account.
/// Args: address (Address).
pub const PORTFOLIO_CHECK: &str = r#"
import NonFungibleToken from 0x1d7e57aa55817448
import TopShot from 0x0ea2b1c0df6d07531

pub fun main(address: Address): [TopShot.MomentData] {
    let account = getAccount(address)
    let collection = account.getCapability(/public/topshotCollection)
        .borrow<&TopShot.Collection{NonFungibleToken.CollectionPublic}>()
        ?? panic("Could not borrow TopShot collection")

    let moments: [TopShot.MomentData] = []
    let ids = collection.getIDs()

    for id in ids {
        if let moment = collection.borrowMoment(id: id) {
            moments.append(moment.getData())
        }
    }

    return moments
}
"#;
